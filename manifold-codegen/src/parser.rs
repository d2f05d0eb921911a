//! Recursive-descent parser for GraphQL SDL.
//!
//! Directives and `directive` definitions are parsed and dropped. Executable
//! definitions (operations, fragments) are rejected.

use crate::ast::{
    Definition, Document, EnumValue, FieldDef, InputValue, OperationKind, TypeDef, TypeKind,
    TypeRef,
};
use crate::lexer::{Spanned, SyntaxError, Token, tokenize};

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

type PResult<T> = Result<T, SyntaxError>;

/// Parse one schema document.
pub(crate) fn parse_document(src: &str) -> PResult<Document> {
    let mut parser = Parser {
        tokens: tokenize(src)?,
        pos: 0,
    };
    let mut doc = Document::default();
    while parser.peek() != &Token::Eof {
        doc.definitions.extend(parser.definition()?);
    }
    Ok(doc)
}

impl Parser {
    fn current(&self) -> &Spanned {
        // tokenize always ends with Eof, and advance never moves past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &Token {
        &self.current().token
    }

    fn peek_name(&self) -> Option<&str> {
        match self.peek() {
            Token::Name(n) => Some(n),
            _ => None,
        }
    }

    fn advance(&mut self) -> Token {
        let t = self.current().token.clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn error_here(&self, message: impl Into<String>) -> SyntaxError {
        let cur = self.current();
        SyntaxError {
            line: cur.line,
            column: cur.column,
            message: message.into(),
        }
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        self.error_here(format!("expected {expected}, found {}", self.peek()))
    }

    fn is_punct(&self, c: char) -> bool {
        self.peek() == &Token::Punct(c)
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if self.is_punct(c) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, c: char) -> PResult<()> {
        if self.eat_punct(c) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{c}'")))
        }
    }

    fn name(&mut self) -> PResult<String> {
        if let Token::Name(n) = self.peek() {
            let n = n.clone();
            self.advance();
            Ok(n)
        } else {
            Err(self.unexpected("a name"))
        }
    }

    fn keyword(&mut self, kw: &str) -> PResult<()> {
        if self.peek_name() == Some(kw) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{kw}'")))
        }
    }

    fn description(&mut self) -> Option<String> {
        if let Token::Str(text) = self.peek() {
            let text = text.clone();
            self.advance();
            Some(text)
        } else {
            None
        }
    }

    /// One top-level definition. `directive` definitions yield nothing.
    fn definition(&mut self) -> PResult<Option<Definition>> {
        let description = self.description();
        let (line, column) = (self.current().line, self.current().column);
        let Some(mut word) = self.peek_name().map(str::to_string) else {
            if self.is_punct('{') {
                return Err(self.error_here("executable definitions are not allowed in a schema"));
            }
            return Err(self.unexpected("a definition"));
        };

        self.advance();
        let extension = word == "extend";
        if extension {
            word = self.name()?;
        }

        let mut def = match word.as_str() {
            "schema" => return self.schema_definition(extension).map(Some),
            "directive" if !extension => {
                self.directive_definition()?;
                return Ok(None);
            }
            "type" => self.object_like(TypeKind::Object)?,
            "interface" => self.object_like(TypeKind::Interface)?,
            "input" => self.input_definition()?,
            "enum" => self.enum_definition()?,
            "union" => self.union_definition()?,
            "scalar" => {
                let name = self.name()?;
                self.directives()?;
                TypeDef::new(TypeKind::Scalar, name)
            }
            "query" | "mutation" | "subscription" | "fragment" => {
                return Err(SyntaxError {
                    line,
                    column,
                    message: format!("executable definition '{word}' is not allowed in a schema"),
                });
            }
            other => {
                return Err(SyntaxError {
                    line,
                    column,
                    message: format!("unknown definition '{other}'"),
                });
            }
        };
        def.description = description;
        def.extension = extension;
        def.line = line;
        Ok(Some(Definition::Type(def)))
    }

    fn schema_definition(&mut self, extension: bool) -> PResult<Definition> {
        self.directives()?;
        let mut operations = Vec::new();
        if self.eat_punct('{') {
            while !self.eat_punct('}') {
                let kind = match self.name()?.as_str() {
                    "query" => OperationKind::Query,
                    "mutation" => OperationKind::Mutation,
                    "subscription" => OperationKind::Subscription,
                    other => {
                        return Err(self.error_here(format!("unknown operation type '{other}'")));
                    }
                };
                self.expect_punct(':')?;
                operations.push((kind, self.name()?));
            }
        } else if !extension {
            return Err(self.unexpected("'{'"));
        }
        Ok(Definition::Schema {
            operations,
            extension,
        })
    }

    fn directive_definition(&mut self) -> PResult<()> {
        self.expect_punct('@')?;
        self.name()?;
        if self.is_punct('(') {
            self.arguments_definition()?;
        }
        if self.peek_name() == Some("repeatable") {
            self.advance();
        }
        self.keyword("on")?;
        self.eat_punct('|');
        self.name()?;
        while self.eat_punct('|') {
            self.name()?;
        }
        Ok(())
    }

    fn object_like(&mut self, kind: TypeKind) -> PResult<TypeDef> {
        let mut def = TypeDef::new(kind, self.name()?);
        if self.peek_name() == Some("implements") {
            self.advance();
            self.eat_punct('&');
            def.implements.push(self.name()?);
            while self.eat_punct('&') {
                def.implements.push(self.name()?);
            }
        }
        self.directives()?;
        if self.eat_punct('{') {
            while !self.eat_punct('}') {
                def.fields.push(self.field_definition()?);
            }
        }
        Ok(def)
    }

    fn field_definition(&mut self) -> PResult<FieldDef> {
        let description = self.description();
        let name = self.name()?;
        let arguments = if self.is_punct('(') {
            self.arguments_definition()?
        } else {
            Vec::new()
        };
        self.expect_punct(':')?;
        let ty = self.type_ref()?;
        self.directives()?;
        Ok(FieldDef {
            name,
            description,
            arguments,
            ty,
            default: None,
        })
    }

    fn arguments_definition(&mut self) -> PResult<Vec<InputValue>> {
        self.expect_punct('(')?;
        let mut out = Vec::new();
        while !self.eat_punct(')') {
            out.push(self.input_value()?);
        }
        if out.is_empty() {
            return Err(self.error_here("argument list must not be empty"));
        }
        Ok(out)
    }

    fn input_value(&mut self) -> PResult<InputValue> {
        let description = self.description();
        let name = self.name()?;
        self.expect_punct(':')?;
        let ty = self.type_ref()?;
        let default = if self.eat_punct('=') {
            Some(self.const_value()?)
        } else {
            None
        };
        self.directives()?;
        Ok(InputValue {
            name,
            description,
            ty,
            default,
        })
    }

    fn input_definition(&mut self) -> PResult<TypeDef> {
        let mut def = TypeDef::new(TypeKind::Input, self.name()?);
        self.directives()?;
        if self.eat_punct('{') {
            while !self.eat_punct('}') {
                let v = self.input_value()?;
                def.fields.push(FieldDef {
                    name: v.name,
                    description: v.description,
                    arguments: Vec::new(),
                    ty: v.ty,
                    default: v.default,
                });
            }
        }
        Ok(def)
    }

    fn enum_definition(&mut self) -> PResult<TypeDef> {
        let mut def = TypeDef::new(TypeKind::Enum, self.name()?);
        self.directives()?;
        if self.eat_punct('{') {
            while !self.eat_punct('}') {
                let description = self.description();
                let name = self.name()?;
                if matches!(name.as_str(), "true" | "false" | "null") {
                    return Err(self.error_here(format!("'{name}' is not a valid enum value")));
                }
                self.directives()?;
                def.values.push(EnumValue { name, description });
            }
        }
        Ok(def)
    }

    fn union_definition(&mut self) -> PResult<TypeDef> {
        let mut def = TypeDef::new(TypeKind::Union, self.name()?);
        self.directives()?;
        if self.eat_punct('=') {
            self.eat_punct('|');
            def.members.push(self.name()?);
            while self.eat_punct('|') {
                def.members.push(self.name()?);
            }
        }
        Ok(def)
    }

    fn type_ref(&mut self) -> PResult<TypeRef> {
        let inner = if self.eat_punct('[') {
            let item = self.type_ref()?;
            self.expect_punct(']')?;
            TypeRef::List(Box::new(item))
        } else {
            TypeRef::Named(self.name()?)
        };
        Ok(if self.eat_punct('!') {
            TypeRef::NonNull(Box::new(inner))
        } else {
            inner
        })
    }

    fn directives(&mut self) -> PResult<()> {
        while self.eat_punct('@') {
            self.name()?;
            if self.eat_punct('(') {
                while !self.eat_punct(')') {
                    self.name()?;
                    self.expect_punct(':')?;
                    self.const_value()?;
                }
            }
        }
        Ok(())
    }

    /// A constant value, rendered back to canonical GraphQL text.
    fn const_value(&mut self) -> PResult<String> {
        match self.peek().clone() {
            Token::Int(v) | Token::Float(v) => {
                self.advance();
                Ok(v)
            }
            Token::Str(s) => {
                self.advance();
                Ok(quote(&s))
            }
            Token::Name(n) => {
                self.advance();
                Ok(n)
            }
            Token::Punct('[') => {
                self.advance();
                let mut items = Vec::new();
                while !self.eat_punct(']') {
                    items.push(self.const_value()?);
                }
                Ok(format!("[{}]", items.join(", ")))
            }
            Token::Punct('{') => {
                self.advance();
                let mut fields = Vec::new();
                while !self.eat_punct('}') {
                    let name = self.name()?;
                    self.expect_punct(':')?;
                    fields.push(format!("{name}: {}", self.const_value()?));
                }
                Ok(format!("{{{}}}", fields.join(", ")))
            }
            Token::Punct('$') => Err(self.error_here("variables are not allowed in constant values")),
            _ => Err(self.unexpected("a value")),
        }
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn types(src: &str) -> Vec<TypeDef> {
        parse_document(src)
            .unwrap()
            .definitions
            .into_iter()
            .filter_map(|d| match d {
                Definition::Type(t) => Some(t),
                Definition::Schema { .. } => None,
            })
            .collect()
    }

    #[test]
    fn parses_object_with_arguments_and_defaults() {
        let t = types(
            r#"
            "Root" type Query {
              assets(filter: AssetFilter, limit: Int = 50): [Asset!]!
            }"#,
        );
        assert_eq!(t.len(), 1);
        assert_eq!(t[0].description.as_deref(), Some("Root"));
        let f = &t[0].fields[0];
        assert_eq!(f.name, "assets");
        assert_eq!(f.ty.to_string(), "[Asset!]!");
        assert_eq!(f.ty.base(), "Asset");
        assert_eq!(f.arguments[1].default.as_deref(), Some("50"));
    }

    #[test]
    fn parses_all_type_kinds_and_ignores_directives() {
        let t = types(
            r#"
            directive @auth(role: String = "x") repeatable on FIELD_DEFINITION | OBJECT
            scalar DateTime @specifiedBy(url: "https://example.com")
            interface Node { id: ID! }
            type Office implements Node & Named @auth { id: ID! @deprecated(reason: "no") }
            input Filter { ids: [ID!] = [], nested: Inner = {a: 1, b: "two"} }
            enum Role { ADMIN USER }
            union Item = | Office | Asset
            extend type Office { name: String }
            "#,
        );
        let kinds: Vec<TypeKind> = t.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TypeKind::Scalar,
                TypeKind::Interface,
                TypeKind::Object,
                TypeKind::Input,
                TypeKind::Enum,
                TypeKind::Union,
                TypeKind::Object,
            ]
        );
        assert_eq!(t[2].implements, vec!["Node", "Named"]);
        assert_eq!(t[3].fields[1].default.as_deref(), Some(r#"{a: 1, b: "two"}"#));
        assert_eq!(t[4].values.len(), 2);
        assert_eq!(t[5].members, vec!["Office", "Asset"]);
        assert!(t[6].extension);
    }

    #[test]
    fn parses_schema_block() {
        let doc = parse_document("schema { query: RootQuery mutation: RootMutation }").unwrap();
        assert_eq!(
            doc.definitions,
            vec![Definition::Schema {
                operations: vec![
                    (OperationKind::Query, "RootQuery".to_string()),
                    (OperationKind::Mutation, "RootMutation".to_string()),
                ],
                extension: false,
            }]
        );
    }

    #[test]
    fn errors_carry_position() {
        let err = parse_document("type Query {\n  offices [Office]\n}").unwrap_err();
        assert_eq!((err.line, err.column), (2, 11));
        assert!(err.message.contains("expected ':'"), "{}", err.message);
    }

    #[test]
    fn rejects_executable_definitions() {
        let err = parse_document("query { offices { id } }").unwrap_err();
        assert!(err.message.contains("executable"), "{}", err.message);
        let err = parse_document("{ offices { id } }").unwrap_err();
        assert!(err.message.contains("executable"), "{}", err.message);
    }

    #[test]
    fn unterminated_type_body_reports_eof() {
        let err = parse_document("type Query {\n  a: Int\n").unwrap_err();
        assert!(err.message.contains("end of file"), "{}", err.message);
    }
}
