//! Parameter shapes and textual declarations
//!
//! Accepted forms (whitespace-insensitive, paths reduced to their last
//! segment, `&`/`&mut` prefixes ignored):
//!
//! ```text
//! Commands
//! Res<T>        Res<Option<T>>        Option<Res<T>>
//! Query<A, B, Option<C>>
//! ```
//!
//! A well-formed declaration naming a type the world has not seen yet still
//! resolves: the resource binds as missing and the query field matches
//! nothing.

use std::fmt;

use thiserror::Error;

use crate::ecs::query::QuerySpec;
use crate::ecs::registry::{TypeKey, TypeRegistry};

/// What a system asks for in one parameter position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamShape {
    Commands,
    Resource { key: TypeKey, optional: bool },
    /// `Res<..>` naming a type no resource has been registered under
    UnknownResource { name: String, optional: bool },
    Query(QuerySpec),
}

/// A parameter as declared at registration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamDecl {
    Shape(ParamShape),
    Text(String),
}

impl ParamDecl {
    /// Resolve the declaration against the names known to `registry`.
    pub fn resolve(&self, registry: &TypeRegistry) -> Result<ParamShape, ParamError> {
        match self {
            ParamDecl::Shape(shape) => Ok(shape.clone()),
            ParamDecl::Text(text) => classify(&TypeExpr::parse(text)?, registry),
        }
    }
}

impl fmt::Display for ParamDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamDecl::Text(text) => f.write_str(text),
            ParamDecl::Shape(ParamShape::Commands) => f.write_str("Commands"),
            ParamDecl::Shape(ParamShape::Resource { key, optional }) => {
                if *optional {
                    write!(f, "Res<Option<{key}>>")
                } else {
                    write!(f, "Res<{key}>")
                }
            }
            ParamDecl::Shape(ParamShape::UnknownResource { name, optional }) => {
                if *optional {
                    write!(f, "Res<Option<{name}>>")
                } else {
                    write!(f, "Res<{name}>")
                }
            }
            ParamDecl::Shape(ParamShape::Query(spec)) => {
                f.write_str("Query<")?;
                for (index, field) in spec.fields().iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    if field.optional {
                        write!(f, "Option<{}>", field.key)?;
                    } else {
                        write!(f, "{}", field.key)?;
                    }
                }
                f.write_str(">")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("malformed type expression at byte {0}")]
    Malformed(usize),
    #[error("expected Commands, Res<T> or Query<...>")]
    UnknownShape,
    #[error("query declares no components")]
    EmptyQuery,
}

/// `Name<Arg, ...>` as written in a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TypeExpr {
    name: String,
    args: Vec<TypeExpr>,
}

impl TypeExpr {
    fn parse(src: &str) -> Result<Self, ParamError> {
        let mut parser = Parser { src, pos: 0 };
        let expr = parser.expr()?;
        parser.skip_ws();
        if parser.pos != src.len() {
            return Err(ParamError::Malformed(parser.pos));
        }
        Ok(expr)
    }

    fn is_bare(&self) -> bool {
        self.args.is_empty()
    }

    /// Strip any number of `Option<...>` wrappers.
    fn unwrap_optional(&self) -> (&TypeExpr, bool) {
        let mut expr = self;
        let mut optional = false;
        while expr.name == "Option" && expr.args.len() == 1 {
            optional = true;
            expr = &expr.args[0];
        }
        (expr, optional)
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Result<TypeExpr, ParamError> {
        self.skip_ws();
        if self.eat('&') {
            self.skip_ws();
            let rest = &self.src[self.pos..];
            if rest.starts_with("mut") && rest[3..].starts_with(char::is_whitespace) {
                self.pos += 3;
            }
        }
        let name = self.ident()?;
        let mut args = Vec::new();
        self.skip_ws();
        if self.eat('<') {
            loop {
                self.skip_ws();
                if self.eat('>') {
                    break;
                }
                args.push(self.expr()?);
                self.skip_ws();
                if self.eat(',') {
                    continue;
                }
                if self.eat('>') {
                    break;
                }
                return Err(ParamError::Malformed(self.pos));
            }
        }
        Ok(TypeExpr { name, args })
    }

    fn ident(&mut self) -> Result<String, ParamError> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == ':' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        let path = &self.src[start..self.pos];
        let name = path.rsplit("::").next().unwrap_or(path);
        if name.is_empty() {
            return Err(ParamError::Malformed(start));
        }
        Ok(name.to_string())
    }
}

fn classify(expr: &TypeExpr, registry: &TypeRegistry) -> Result<ParamShape, ParamError> {
    let (inner, outer_optional) = expr.unwrap_optional();
    match (inner.name.as_str(), inner.args.as_slice()) {
        ("Commands", []) if !outer_optional => Ok(ParamShape::Commands),
        ("Res" | "ResMut" | "Resource", [arg]) => {
            let (target, inner_optional) = arg.unwrap_optional();
            if !target.is_bare() {
                return Err(ParamError::UnknownShape);
            }
            let optional = outer_optional || inner_optional;
            Ok(match registry.resource(&target.name) {
                Some(key) => ParamShape::Resource { key, optional },
                None => ParamShape::UnknownResource {
                    name: target.name.clone(),
                    optional,
                },
            })
        }
        ("Query", []) if !outer_optional => Err(ParamError::EmptyQuery),
        ("Query", fields) if !outer_optional => {
            let mut spec = QuerySpec::new();
            for field in fields {
                let (target, optional) = field.unwrap_optional();
                if !target.is_bare() {
                    return Err(ParamError::UnknownShape);
                }
                let key = registry
                    .component(&target.name)
                    .unwrap_or_else(TypeKey::unregistered);
                spec = spec.field(key, optional);
            }
            Ok(ParamShape::Query(spec))
        }
        _ => Err(ParamError::UnknownShape),
    }
}
