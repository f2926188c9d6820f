//! Class compilation (spec §4.3 "Classes").

use std::rc::Rc;

use momiji_lex::TokenKind;

use super::locals::FunctionType;
use super::{ClassState, Compiler};
use crate::opcode::OpCode;

impl<'src> Compiler<'src> {
    /// `class C [ : Super ] { [ local field = expr; ]* methods* }`.
    pub(super) fn class_declaration(&mut self) {
        self.consume(TokenKind::Identifier, "expected a class name");
        let class_name: Rc<str> = Rc::from(self.previous.lexeme);
        let name_index = self.identifier_constant(&class_name);
        self.declare_variable();

        self.emit_op_u32(OpCode::Class, name_index);
        self.define_variable(name_index);

        self.class = Some(Box::new(ClassState {
            enclosing: self.class.take(),
            has_superclass: false,
        }));

        self.begin_scope();

        if self.match_token(TokenKind::Colon) {
            self.consume(TokenKind::Identifier, "expected a superclass name");
            let superclass_name: &str = self.previous.lexeme;
            if superclass_name == &*class_name {
                self.error("a class cannot inherit from itself");
            }
            self.named_variable(superclass_name, false);

            self.add_local("super".to_string());
            self.mark_initialized();

            self.named_variable(&class_name, false);
            self.emit_op(OpCode::Inherit);

            if let Some(class) = self.class.as_mut() {
                class.has_superclass = true;
            }
        }

        self.named_variable(&class_name, false);

        self.consume(TokenKind::BraceOpen, "expected '{' before class body");
        while !self.check(TokenKind::BraceClose) && !self.check(TokenKind::Eof) {
            if self.match_token(TokenKind::Local) {
                self.init_property();
                continue;
            }
            self.method(&class_name);
        }
        self.consume(TokenKind::BraceClose, "expected '}' after class body");
        self.emit_op(OpCode::Pop);

        self.end_scope();
        self.class = self.class.take().and_then(|class| class.enclosing);
    }

    /// A method whose name equals the enclosing class's name is the
    /// constructor (`FunctionType::Initializer`); every other method
    /// compiles as a plain `FunctionType::Method`.
    fn method(&mut self, class_name: &str) {
        self.consume(TokenKind::Identifier, "expected a method name");
        let method_name: Rc<str> = Rc::from(self.previous.lexeme);
        let name_index = self.identifier_constant(&method_name);
        let function_type = if &*method_name == class_name {
            FunctionType::Initializer
        } else {
            FunctionType::Method
        };
        self.function_body(function_type, Some(method_name));
        self.emit_op_u32(OpCode::Method, name_index);
    }

    /// `local field = expr;` inside a class body: a default instance
    /// field, applied to every new instance before the constructor runs
    /// (and copied into subclasses by `OP_INHERIT`).
    fn init_property(&mut self) {
        self.consume(TokenKind::Identifier, "expected a field name");
        let name_index = self.identifier_constant(self.previous.lexeme);
        if self.match_token(TokenKind::Equal) {
            self.expression();
        } else {
            self.emit_op(OpCode::Null);
        }
        self.emit_op_u32(OpCode::InitProperty, name_index);
        self.consume(TokenKind::Semicolon, "expected ';' after field declaration");
    }
}
