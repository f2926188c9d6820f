//! Statement parsing (spec §4.3 "Statements").

use std::rc::Rc;

use momiji_lex::TokenKind;

use super::locals::FunctionType;
use super::Compiler;
use crate::opcode::OpCode;

#[derive(PartialEq)]
enum SwitchState {
    Start,
    Case,
    Default,
}

impl<'src> Compiler<'src> {
    pub(super) fn declaration(&mut self) {
        if self.match_token(TokenKind::Class) {
            self.class_declaration();
        } else if self.match_token(TokenKind::Function) {
            self.function_declaration();
        } else if self.match_token(TokenKind::Global) {
            self.global_declaration();
        } else if self.match_token(TokenKind::Local) || self.match_token(TokenKind::Var) {
            self.local_declaration();
        } else {
            self.statement();
        }

        if self.panic_mode {
            self.synchronize();
        }
    }

    fn statement(&mut self) {
        if self.match_token(TokenKind::Print) {
            self.print_statement();
        } else if self.match_token(TokenKind::If) {
            self.if_statement();
        } else if self.match_token(TokenKind::While) {
            self.while_statement();
        } else if self.match_token(TokenKind::For) {
            self.for_statement();
        } else if self.match_token(TokenKind::Switch) {
            self.switch_statement();
        } else if self.match_token(TokenKind::Return) {
            self.return_statement();
        } else if self.match_token(TokenKind::BraceOpen) {
            self.begin_scope();
            self.block();
            self.end_scope();
        } else if self.current.kind.is_reserved_unimplemented() {
            self.reserved_keyword_error();
            self.advance();
        } else {
            self.expression_statement();
        }
    }

    /// Compiles declarations until the closing `}`, which is consumed.
    /// Shared by block statements and function/method bodies.
    pub(super) fn block(&mut self) {
        while !self.check(TokenKind::BraceClose) && !self.check(TokenKind::Eof) {
            self.declaration();
        }
        self.consume(TokenKind::BraceClose, "expected '}' after block");
    }

    fn print_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::Semicolon, "expected ';' after value");
        self.emit_op(OpCode::Print);
    }

    fn expression_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::Semicolon, "expected ';' after expression");
        self.emit_op(OpCode::Pop);
    }

    fn if_statement(&mut self) {
        self.consume(TokenKind::ParenOpen, "expected '(' after 'if'");
        self.expression();
        self.consume(TokenKind::ParenClose, "expected ')' after condition");

        let then_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.statement();

        let else_jump = self.emit_jump(OpCode::Jump);
        self.patch_jump(then_jump);
        self.emit_op(OpCode::Pop);

        if self.match_token(TokenKind::Else) {
            self.statement();
        }
        self.patch_jump(else_jump);
    }

    fn while_statement(&mut self) {
        let loop_start = self.chunk_len();
        self.consume(TokenKind::ParenOpen, "expected '(' after 'while'");
        self.expression();
        self.consume(TokenKind::ParenClose, "expected ')' after condition");

        let exit_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.statement();
        self.emit_loop(loop_start);

        self.patch_jump(exit_jump);
        self.emit_op(OpCode::Pop);
    }

    /// `for (init; cond; incr) body`, desugared exactly as the distilled
    /// source's `StatementFor`: the increment is compiled once, between
    /// the condition test and the body, but reached only after the body
    /// via a jump, then loops back to the condition.
    fn for_statement(&mut self) {
        self.begin_scope();
        self.consume(TokenKind::ParenOpen, "expected '(' after 'for'");

        if self.match_token(TokenKind::Semicolon) {
            // No initializer clause.
        } else if self.match_token(TokenKind::Local) || self.match_token(TokenKind::Var) {
            self.local_declaration();
        } else if self.match_token(TokenKind::Global) {
            self.global_declaration();
        } else {
            self.expression_statement();
        }

        let mut loop_start = self.chunk_len();
        let mut exit_jump = None;
        if !self.match_token(TokenKind::Semicolon) {
            self.expression();
            self.consume(TokenKind::Semicolon, "expected ';' after loop condition");
            exit_jump = Some(self.emit_jump(OpCode::JumpIfFalse));
            self.emit_op(OpCode::Pop);
        }

        if !self.check(TokenKind::ParenClose) {
            let body_jump = self.emit_jump(OpCode::Jump);
            let increment_start = self.chunk_len();
            self.expression();
            self.emit_op(OpCode::Pop);
            self.consume(TokenKind::ParenClose, "expected ')' after for clauses");

            self.emit_loop(loop_start);
            loop_start = increment_start;
            self.patch_jump(body_jump);
        } else {
            self.consume(TokenKind::ParenClose, "expected ')' after for clauses");
        }

        self.statement();
        self.emit_loop(loop_start);

        if let Some(exit_jump) = exit_jump {
            self.patch_jump(exit_jump);
            self.emit_op(OpCode::Pop);
        }
        self.end_scope();
    }

    /// `switch (e) { case v: … default: … }`. Ported statement-for-
    /// statement from the distilled source's state machine: `State`
    /// tracks whether any case has been opened yet and whether `default`
    /// has already closed the case-adding phase.
    fn switch_statement(&mut self) {
        self.consume(TokenKind::ParenOpen, "expected '(' after 'switch'");
        self.expression();
        self.consume(TokenKind::ParenClose, "expected ')' after switch value");
        self.consume(TokenKind::BraceOpen, "expected '{' before switch body");

        let mut state = SwitchState::Start;
        let mut case_ends: Vec<usize> = Vec::new();
        let mut previous_case_skip: Option<usize> = None;

        while !self.match_token(TokenKind::BraceClose) && !self.check(TokenKind::Eof) {
            let mut is_default = false;
            let is_case_label = if self.match_token(TokenKind::Case) {
                true
            } else if self.match_token(TokenKind::Default) {
                is_default = true;
                true
            } else {
                false
            };

            if is_case_label {
                if state == SwitchState::Default {
                    self.error("a 'case' or 'default' cannot follow the default case");
                }
                if state == SwitchState::Case {
                    case_ends.push(self.emit_jump(OpCode::Jump));
                    self.patch_jump(previous_case_skip.take().unwrap_or(0));
                    self.emit_op(OpCode::Pop);
                }

                if is_default {
                    state = SwitchState::Default;
                    self.consume(TokenKind::Colon, "expected ':' after 'default'");
                    previous_case_skip = None;
                } else {
                    state = SwitchState::Case;
                    self.emit_op(OpCode::Duplicate);
                    self.expression();
                    self.consume(TokenKind::Colon, "expected ':' after case value");
                    self.emit_op(OpCode::Equal);
                    previous_case_skip = Some(self.emit_jump(OpCode::JumpIfFalse));
                    self.emit_op(OpCode::Pop);
                }
            } else {
                if state == SwitchState::Start {
                    self.error("cannot have statements before any case");
                }
                self.begin_scope();
                self.declaration();
                self.end_scope();
            }
        }

        if state == SwitchState::Case {
            self.patch_jump(previous_case_skip.unwrap_or(0));
            self.emit_op(OpCode::Pop);
        }

        for jump in case_ends {
            self.patch_jump(jump);
        }
        self.emit_op(OpCode::Pop);
    }

    fn return_statement(&mut self) {
        if self.state.function_type == FunctionType::Script {
            self.error("cannot return from top-level code");
        }

        if self.match_token(TokenKind::Semicolon) {
            self.emit_return();
            return;
        }

        if self.state.function_type == FunctionType::Initializer {
            self.error("cannot return a value from an initializer");
        }
        self.expression();
        self.consume(TokenKind::Semicolon, "expected ';' after return value");
        self.emit_op(OpCode::Return);
    }

    /// `global name = e;` always defines in the globals table, even
    /// inside a nested scope.
    fn global_declaration(&mut self) {
        self.consume(TokenKind::Identifier, "expected a global variable name");
        let name_index = self.identifier_constant(self.previous.lexeme);
        if self.match_token(TokenKind::Equal) {
            self.expression();
        } else {
            self.emit_op(OpCode::Null);
        }
        self.consume(TokenKind::Semicolon, "expected ';' after variable declaration");
        self.emit_op_u32(OpCode::DefineGlobal, name_index);
    }

    /// `local name = e;` / `var name = e;`: a true local inside any
    /// scope; at the top level (scope depth 0) there is no enclosing
    /// scope to hold a local in, so it falls back to the same globals
    /// table `global` uses.
    fn local_declaration(&mut self) {
        let global = self.parse_variable("expected a variable name");
        if self.match_token(TokenKind::Equal) {
            self.expression();
        } else {
            self.emit_op(OpCode::Null);
        }
        self.consume(TokenKind::Semicolon, "expected ';' after variable declaration");
        self.define_variable(global);
    }

    /// `function name(params) { … }` / `function name(params) => expr;`.
    /// A bare `function(params) …` with no name (checked by peeking at
    /// the token right after `function`, already consumed by our
    /// caller) compiles as an anonymous closure expression statement
    /// instead — unlike the distilled source, the resulting value is
    /// popped afterward rather than left to grow the stack unbounded.
    fn function_declaration(&mut self) {
        if self.check(TokenKind::ParenOpen) {
            self.function_body(FunctionType::Function, None);
            self.consume(TokenKind::Semicolon, "expected ';' after function expression");
            self.emit_op(OpCode::Pop);
            return;
        }

        let global = self.parse_variable("expected a function name");
        self.mark_initialized();
        let name: Rc<str> = Rc::from(self.previous.lexeme);
        self.function_body(FunctionType::Function, Some(name));
        self.define_variable(global);
    }
}
