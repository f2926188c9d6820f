//! Expression parsing: the Pratt precedence-climbing core (spec §4.3
//! "Pratt parsing" and "Expressions emit").

use std::rc::Rc;

use momiji_lex::TokenKind;

use super::precedence::{infix_precedence, Precedence};
use super::Compiler;
use crate::chunk::Constant;
use crate::compile::locals::FunctionType;
use crate::opcode::OpCode;

impl<'src> Compiler<'src> {
    pub(super) fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    fn parse_precedence(&mut self, precedence: Precedence) {
        self.advance();
        let can_assign = precedence <= Precedence::Assignment;
        let prefix_kind = self.previous.kind;
        if !self.prefix(prefix_kind, can_assign) {
            self.error("expected an expression");
            return;
        }

        while precedence <= infix_precedence(self.current.kind) {
            self.advance();
            let infix_kind = self.previous.kind;
            self.infix(infix_kind, can_assign);
        }

        if can_assign && self.match_token(TokenKind::Equal) {
            self.error("invalid assignment target");
        }
    }

    fn prefix(&mut self, kind: TokenKind, can_assign: bool) -> bool {
        use TokenKind as K;
        match kind {
            K::ParenOpen => self.grouping(),
            K::Minus | K::Bang => self.unary(kind),
            K::PlusPlus | K::MinusMinus => self.prefix_incdec(kind),
            K::Number => self.number(),
            K::String => self.string_literal(),
            K::True => self.emit_op(OpCode::True),
            K::False => self.emit_op(OpCode::False),
            K::Null => self.emit_op(OpCode::Null),
            K::Maybe => self.emit_op(OpCode::Maybe),
            K::Identifier => self.variable(can_assign),
            K::This => self.this_expr(),
            K::Super => self.super_expr(),
            K::Function => self.lambda(),
            K::BracketOpen => self.array_literal(),
            K::BraceOpen => self.map_literal(),
            _ => return false,
        }
        true
    }

    fn infix(&mut self, kind: TokenKind, can_assign: bool) {
        use TokenKind as K;
        match kind {
            K::Plus
            | K::Minus
            | K::Star
            | K::Slash
            | K::Percent
            | K::Ampersand
            | K::Pipe
            | K::EqualEqual
            | K::BangEqual
            | K::Less
            | K::LessEqual
            | K::Greater
            | K::GreaterEqual
            | K::Is => self.binary(kind),
            K::And => self.and_expr(),
            K::Or => self.or_expr(),
            K::ParenOpen => self.call_expr(),
            K::Dot => self.dot_expr(can_assign),
            K::BracketOpen => self.index_expr(can_assign),
            _ => {}
        }
    }

    fn grouping(&mut self) {
        self.expression();
        self.consume(TokenKind::ParenClose, "expected ')' after expression");
    }

    fn unary(&mut self, op: TokenKind) {
        self.parse_precedence(Precedence::Unary);
        match op {
            TokenKind::Minus => self.emit_op(OpCode::Negate),
            TokenKind::Bang => self.emit_op(OpCode::Not),
            _ => unreachable!("unary dispatched for non-unary token"),
        }
    }

    /// Prefix `++x`/`--x`: pushes the incremented value twice (the
    /// duplicate is what the enclosing expression sees), writes it back,
    /// then pops the write-back's own copy, leaving the new value as the
    /// expression result (spec §4.4's "pre-increase pushes v+1 and a
    /// duplicate, and the writer pops the extra").
    fn prefix_incdec(&mut self, op: TokenKind) {
        self.consume(TokenKind::Identifier, "expected a variable after '++'/'--'");
        let name = self.previous.lexeme;
        let (get_op, set_op, operand) = self.resolve_named(name);
        self.emit_op_u32(get_op, operand);
        match op {
            TokenKind::PlusPlus => self.emit_op(OpCode::PreIncrease),
            TokenKind::MinusMinus => self.emit_op(OpCode::PreDecrease),
            _ => unreachable!(),
        }
        self.emit_op_u32(set_op, operand);
        self.emit_op(OpCode::Pop);
    }

    fn binary(&mut self, op: TokenKind) {
        let precedence = infix_precedence(op);
        self.parse_precedence(precedence.next());
        let opcode = match op {
            TokenKind::Plus => OpCode::Add,
            TokenKind::Minus => OpCode::Subtract,
            TokenKind::Star => OpCode::Multiply,
            TokenKind::Slash => OpCode::Divide,
            TokenKind::Percent => OpCode::Mod,
            TokenKind::Ampersand => OpCode::BitwiseAnd,
            TokenKind::Pipe => OpCode::BitwiseOr,
            TokenKind::EqualEqual => OpCode::Equal,
            TokenKind::BangEqual => OpCode::NotEqual,
            TokenKind::Less => OpCode::Smaller,
            TokenKind::LessEqual => OpCode::SmallerEqual,
            TokenKind::Greater => OpCode::Greater,
            TokenKind::GreaterEqual => OpCode::GreaterEqual,
            TokenKind::Is => OpCode::Is,
            _ => unreachable!("binary dispatched for non-binary token"),
        };
        self.emit_op(opcode);
    }

    fn and_expr(&mut self) {
        let end_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.parse_precedence(Precedence::And);
        self.patch_jump(end_jump);
    }

    fn or_expr(&mut self) {
        let else_jump = self.emit_jump(OpCode::JumpIfFalse);
        let end_jump = self.emit_jump(OpCode::Jump);
        self.patch_jump(else_jump);
        self.emit_op(OpCode::Pop);
        self.parse_precedence(Precedence::Or);
        self.patch_jump(end_jump);
    }

    fn number(&mut self) {
        let value = parse_number(self.previous.lexeme);
        self.emit_constant(Constant::Number(value));
    }

    fn string_literal(&mut self) {
        let text = unquote(self.previous.lexeme);
        self.emit_constant(Constant::Str(Rc::from(text)));
    }

    fn variable(&mut self, can_assign: bool) {
        let name = self.previous.lexeme;
        self.named_variable(name, can_assign);
    }

    pub(super) fn named_variable(&mut self, name: &str, can_assign: bool) {
        let (get_op, set_op, operand) = self.resolve_named(name);
        self.assign_or_read(can_assign, get_op, set_op, operand);
    }

    /// Shared by `variable`, `dot_expr`, and `index_expr`: checks for a
    /// plain or compound assignment before falling back to a read (spec
    /// §4.3's "a += b family: desugar to get-op, rhs, arithmetic op,
    /// set-op").
    pub(super) fn assign_or_read(
        &mut self,
        can_assign: bool,
        get_op: OpCode,
        set_op: OpCode,
        operand: u32,
    ) {
        if can_assign && self.match_token(TokenKind::Equal) {
            self.expression();
            self.emit_op_u32(set_op, operand);
            return;
        }
        if can_assign {
            if let Some(arith) = compound_op(self.current.kind) {
                self.advance();
                self.emit_op_u32(get_op, operand);
                self.expression();
                self.emit_op(arith);
                self.emit_op_u32(set_op, operand);
                return;
            }
            // Postfix `x++`/`x--`: the get/set pair lives here rather than
            // in the generic infix table, since only the name-resolution
            // site knows which get/set opcode and operand belong to `x`.
            // Pushes [orig, new], writes the new value back, then pops
            // its own write-back copy, leaving the original as the
            // expression result.
            if self.match_token(TokenKind::PlusPlus) {
                self.emit_op_u32(get_op, operand);
                self.emit_op(OpCode::PostIncrease);
                self.emit_op_u32(set_op, operand);
                self.emit_op(OpCode::Pop);
                return;
            }
            if self.match_token(TokenKind::MinusMinus) {
                self.emit_op_u32(get_op, operand);
                self.emit_op(OpCode::PostDecrease);
                self.emit_op_u32(set_op, operand);
                self.emit_op(OpCode::Pop);
                return;
            }
        }
        self.emit_op_u32(get_op, operand);
    }

    fn call_expr(&mut self) {
        let argc = self.argument_list(TokenKind::ParenClose);
        self.emit_op(OpCode::Call);
        self.emit_byte(argc);
    }

    /// Parses a comma-separated argument list up to `closing`, returning
    /// the argument count (max 255, spec's 1-byte argc operand).
    pub(super) fn argument_list(&mut self, closing: TokenKind) -> u8 {
        let mut argc: u32 = 0;
        if !self.check(closing) {
            loop {
                self.expression();
                if argc == 255 {
                    self.error("cannot pass more than 255 arguments");
                }
                argc += 1;
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(closing, "expected ')' after arguments");
        argc as u8
    }

    fn dot_expr(&mut self, can_assign: bool) {
        self.consume(TokenKind::Identifier, "expected a property name after '.'");
        let name_index = self.identifier_constant(self.previous.lexeme);

        if can_assign && self.match_token(TokenKind::Equal) {
            self.expression();
            self.emit_op_u32(OpCode::SetProperty, name_index);
            return;
        }
        if can_assign {
            if let Some(arith) = compound_op(self.current.kind) {
                self.advance();
                self.emit_op_u32(OpCode::GetProperty, name_index);
                self.expression();
                self.emit_op(arith);
                self.emit_op_u32(OpCode::SetProperty, name_index);
                return;
            }
        }
        if self.match_token(TokenKind::ParenOpen) {
            let argc = self.argument_list(TokenKind::ParenClose);
            self.emit_op(OpCode::Invoke);
            self.emit_u32(name_index);
            self.emit_byte(argc);
            return;
        }
        self.emit_op_u32(OpCode::GetProperty, name_index);
    }

    /// `a[i]`, `a[i:j]`, `a[i:j:k]`. Every bound is pushed, defaulting
    /// omitted ones to `OP_NULL`, matching spec §4.3 exactly.
    fn index_expr(&mut self, can_assign: bool) {
        let mut is_ranged = false;
        self.expression();

        if self.match_token(TokenKind::Colon) {
            is_ranged = true;
            if self.check(TokenKind::Colon) || self.check(TokenKind::BracketClose) {
                self.emit_op(OpCode::Null);
            } else {
                self.expression();
            }
            if self.match_token(TokenKind::Colon) {
                if self.check(TokenKind::BracketClose) {
                    self.emit_op(OpCode::Null);
                } else {
                    self.expression();
                }
            } else {
                self.emit_op(OpCode::Null);
            }
        }
        self.consume(TokenKind::BracketClose, "expected ']' after index");

        if is_ranged {
            if can_assign && self.match_token(TokenKind::Equal) {
                self.error("cannot assign to a ranged index");
                self.expression();
                return;
            }
            self.emit_op(OpCode::GetIndexRanged);
            return;
        }

        if can_assign && self.match_token(TokenKind::Equal) {
            self.expression();
            self.emit_op(OpCode::SetIndex);
            return;
        }
        self.emit_op(OpCode::GetIndex);
    }

    fn array_literal(&mut self) {
        self.emit_op(OpCode::Null);
        let mut count: u32 = 0;
        if !self.check(TokenKind::BracketClose) {
            loop {
                self.expression();
                count += 1;
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::BracketClose, "expected ']' after array literal");
        self.emit_op(OpCode::Array);
        let count = u16::try_from(count).unwrap_or_else(|_| {
            self.error("array literal has too many elements");
            0
        });
        self.emit_u16(count);
    }

    fn map_literal(&mut self) {
        self.emit_op(OpCode::Null);
        let mut count: u32 = 0;
        if !self.check(TokenKind::BraceClose) {
            loop {
                self.expression();
                self.consume(TokenKind::Colon, "expected ':' after map key");
                self.expression();
                count += 1;
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::BraceClose, "expected '}' after map literal");
        self.emit_op(OpCode::Map);
        let count = u16::try_from(count).unwrap_or_else(|_| {
            self.error("map literal has too many entries");
            0
        });
        self.emit_u16(count);
    }

    fn this_expr(&mut self) {
        if self.class.is_none() {
            self.error("'this' can only be used inside a method");
            return;
        }
        self.named_variable("this", false);
    }

    fn super_expr(&mut self) {
        match &self.class {
            None => self.error("'super' can only be used inside a class"),
            Some(class) if !class.has_superclass => {
                self.error("'super' cannot be used in a class with no superclass")
            }
            Some(_) => {}
        }

        self.consume(TokenKind::Dot, "expected '.' after 'super'");
        self.consume(TokenKind::Identifier, "expected a superclass method name");
        let name_index = self.identifier_constant(self.previous.lexeme);

        let (this_get, _, this_operand) = self.resolve_named("this");
        let (super_get, _, super_operand) = self.resolve_named("super");

        if self.match_token(TokenKind::ParenOpen) {
            // `this` goes on the stack before the arguments (it becomes
            // the callee's slot 0); `super` is resolved last so it sits
            // on top for SUPER_INVOKE to pop.
            self.emit_op_u32(this_get, this_operand);
            let argc = self.argument_list(TokenKind::ParenClose);
            self.emit_op_u32(super_get, super_operand);
            self.emit_op(OpCode::SuperInvoke);
            self.emit_u32(name_index);
            self.emit_byte(argc);
            return;
        }

        self.emit_op_u32(this_get, this_operand);
        self.emit_op_u32(super_get, super_operand);
        self.emit_op_u32(OpCode::GetSuper, name_index);
    }

    /// `function(params) => expr` or `function(params) { body }`
    /// (spec §4.3's lambda form). Always emits `OP_CLOSURE`, even for a
    /// function that captures nothing, since the upvalue count is only
    /// known once the nested compiler finishes.
    fn lambda(&mut self) {
        self.function_body(FunctionType::Function, None);
    }
}

/// Parses a scanned number lexeme (underscore separators stripped) into
/// an `f64`. Duplicated in miniature from the scanner's own grammar
/// since number parsing is not part of `momiji-lex`'s public surface.
fn parse_number(lexeme: &str) -> f64 {
    if lexeme.contains('_') {
        let cleaned: String = lexeme.chars().filter(|&c| c != '_').collect();
        cleaned.parse().unwrap_or(0.0)
    } else {
        lexeme.parse().unwrap_or(0.0)
    }
}

/// Strips the surrounding `"`s from a scanned string lexeme.
fn unquote(lexeme: &str) -> &str {
    lexeme
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(lexeme)
}

fn compound_op(kind: TokenKind) -> Option<OpCode> {
    match kind {
        TokenKind::PlusEqual => Some(OpCode::Add),
        TokenKind::MinusEqual => Some(OpCode::Subtract),
        TokenKind::StarEqual => Some(OpCode::Multiply),
        TokenKind::SlashEqual => Some(OpCode::Divide),
        _ => None,
    }
}
