use crate::{
    error::{CompileError, CompileErrorKind},
    ir::{Context, Field, Flat, FlatKind, Status, Type, TypeId, TypeKind},
    lexer::{Token, TokenKind},
};

/// Build the IR from a token stream. On success the context holds every
/// declaration in source order with all forward references resolved.
pub fn parse(ctx: &mut Context, tokens: Vec<Token>) -> Result<(), CompileError> {
    Parser {
        ctx,
        tokens,
        pos: 0,
    }
    .run()
}

struct Parser<'a> {
    ctx: &'a mut Context,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    fn line(&self) -> u32 {
        self.tokens[self.pos].line
    }

    fn advance(&mut self) -> TokenKind {
        let t = self.tokens[self.pos].kind.clone();
        if t != TokenKind::Eof {
            self.pos += 1;
        }
        t
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn grammar(&self, msg: impl Into<String>) -> CompileError {
        CompileError::new(self.line(), CompileErrorKind::Grammar(msg.into()))
    }

    fn error(&self, kind: CompileErrorKind) -> CompileError {
        CompileError::new(self.line(), kind)
    }

    fn expect_token(&mut self, kind: TokenKind, msg: &str) -> Result<(), CompileError> {
        if self.eat(&kind) {
            Ok(())
        } else {
            Err(self.grammar(msg))
        }
    }

    fn get_name(&mut self, what: &str) -> Result<String, CompileError> {
        match self.advance() {
            TokenKind::Name(n) => Ok(n),
            _ => Err(self.grammar(format!("{what} name expected"))),
        }
    }

    /// Semicolons and commas are optional separators; both are consumed if
    /// present.
    fn eat_terminator(&mut self) {
        self.eat(&TokenKind::Semicolon);
        self.eat(&TokenKind::Comma);
    }

    /// Integer literal or qualified enumerator `E::member`.
    fn get_number(&mut self) -> Result<i64, CompileError> {
        match self.advance() {
            TokenKind::Number(n) => Ok(n),
            TokenKind::Name(en) => {
                self.expect_token(TokenKind::ColonColon, ":: expected")?;
                let member = self.get_name("enumerator")?;
                self.enum_value(&en, &member)
            }
            _ => Err(self.grammar("number expected")),
        }
    }

    fn enum_value(&self, en: &str, member: &str) -> Result<i64, CompileError> {
        let tid = self
            .ctx
            .find(en)
            .ok_or_else(|| self.error(CompileErrorKind::Undefined(en.into())))?;
        let fid = match self.ctx.typ(tid).kind {
            TypeKind::Enumeration(fid) => fid,
            _ => return Err(self.grammar(format!("`{en}` is not an enum"))),
        };
        self.ctx
            .flat(fid)
            .find(member)
            .map(|f| f.value)
            .ok_or_else(|| self.error(CompileErrorKind::Undefined(format!("{en}::{member}"))))
    }

    fn get_count(&mut self) -> Result<u32, CompileError> {
        let n = self.get_number()?;
        if n < 1 {
            return Err(self.error(CompileErrorKind::BadCount(n)));
        }
        self.expect_token(TokenKind::RBracket, "']' expected after array count")?;
        Ok(n as u32)
    }

    /// `name | optional<T> | vector<T> | fixed_vector<T, N> | string`, all
    /// with any number of `[N]` suffixes.
    fn get_type(&mut self) -> Result<TypeId, CompileError> {
        let name = self.get_name("type")?;
        let mut t = match name.as_str() {
            "optional" => self.get_opt_or_vec(true)?,
            "vector" => self.get_opt_or_vec(false)?,
            "fixed_vector" => self.get_varray()?,
            _ => match self.ctx.find(&name) {
                Some(tid) => tid,
                None => self.ctx.placeholder(&name),
            },
        };
        while self.eat(&TokenKind::LBracket) {
            let count = self.get_count()?;
            t = self.ctx.add_type(Type::composite(TypeKind::Array(t), count));
        }
        Ok(t)
    }

    fn get_opt_or_vec(&mut self, optional: bool) -> Result<TypeId, CompileError> {
        let what = if optional { "optional" } else { "vector" };
        self.expect_token(TokenKind::Lt, "'<' expected after vector or optional")?;
        let t = self.get_type()?;
        self.expect_token(TokenKind::Gt, "'>' expected after vector or optional")?;

        if optional {
            // The inner type may already encode presence; then the optional
            // wrapper is dropped. An undefined inner is normalised after the
            // whole schema is read.
            match self.ctx.typ(self.ctx.peel_arrays(t)).kind {
                TypeKind::Optional(_)
                | TypeKind::Variant(_)
                | TypeKind::Vector(_)
                | TypeKind::String => return Ok(t),
                TypeKind::Flat(fid) => self.ctx.flat_mut(fid).used_as_optional = true,
                _ => {}
            }
            Ok(self.ctx.add_type(Type::composite(TypeKind::Optional(t), 1)))
        } else {
            if let TypeKind::Variant(_) = self.ctx.typ(t).kind {
                return Err(self.error(CompileErrorKind::Composition(format!(
                    "{what} of variant"
                ))));
            }
            Ok(self.ctx.add_type(Type::composite(TypeKind::Vector(t), 1)))
        }
    }

    fn get_varray(&mut self) -> Result<TypeId, CompileError> {
        self.expect_token(TokenKind::Lt, "'<' expected after `fixed_vector`")?;
        let t = self.get_type()?;
        self.expect_token(TokenKind::Comma, "',' expected after type in fixed_vector")?;
        let n = self.get_number()?;
        if n < 1 {
            return Err(self.error(CompileErrorKind::BadCount(n)));
        }
        self.expect_token(TokenKind::Gt, "'>' expected after size in fixed_vector")?;
        if let TypeKind::Variant(_) = self.ctx.typ(t).kind {
            return Err(self.error(CompileErrorKind::Composition(
                "fixed_vector of variant".into(),
            )));
        }
        Ok(self
            .ctx
            .add_type(Type::composite(TypeKind::Varray(t), n as u32)))
    }

    /// Mark an existing member deprecated or deleted and produce the
    /// tombstone that keeps its ordinal occupied.
    fn modify_field(&mut self, flt: &mut Flat, status: Status) -> Result<Field, CompileError> {
        let n = self.get_name("member")?;
        let found = flt.find_mut(&n).ok_or_else(|| {
            self.grammar(format!(
                "{} member `{n}` not found",
                if status == Status::Deprecated {
                    "deprecated"
                } else {
                    "deleted"
                }
            ))
        })?;
        found.status = status;
        self.eat_terminator();

        let mut tomb = Field::new(n, None);
        tomb.status = if status == Status::Deprecated {
            Status::Deprecating
        } else {
            Status::Deleting
        };
        Ok(tomb)
    }

    fn get_field(&mut self, flt: &mut Flat) -> Result<Field, CompileError> {
        let n = self.get_name("member")?;
        if n == "deprecate" {
            return self.modify_field(flt, Status::Deprecated);
        }
        if n == "delete" {
            return self.modify_field(flt, Status::Deleted);
        }
        if flt.find(&n).is_some() {
            return Err(self.error(CompileErrorKind::Duplicate(n)));
        }
        self.expect_token(
            TokenKind::Colon,
            "colon missing after member name",
        )?;
        let t = self.get_type()?;
        let mut fld = Field::new(n, Some(t));
        // optional declared default, e.g. `k : int32 = E::c`
        if self.eat(&TokenKind::Equals) {
            fld.value = self.get_number()?;
        }
        self.eat_terminator();
        Ok(fld)
    }

    fn get_flat(&mut self, name: &str, kind: FlatKind) -> Result<Flat, CompileError> {
        let mut flt = Flat::new(kind, name);
        self.expect_token(TokenKind::LBrace, "'{' expected")?;
        while !self.eat(&TokenKind::RBrace) {
            if *self.peek() == TokenKind::Eof {
                return Err(self.grammar("unexpected end of input"));
            }
            let mut fld = self.get_field(&mut flt)?;
            fld.index = flt.fields.len() as u32;
            flt.fields.push(fld);
        }
        Ok(flt)
    }

    /// `v : view of F` exposes all of `F`; a braced body selects a subset in
    /// the caller's order.
    fn get_view(&mut self, name: &str) -> Result<Flat, CompileError> {
        let of = self.get_name("keyword")?;
        if of != "of" {
            return Err(self.grammar("'of' expected"));
        }
        let target_name = self.get_name("flat")?;
        let target = match self.ctx.find(&target_name) {
            Some(t) => t,
            None => self.ctx.placeholder(&target_name),
        };
        let mut flt = Flat::new(FlatKind::View, name);
        flt.underlying = Some(target);

        if self.eat(&TokenKind::LBrace) {
            // a subset needs the target's fields right away
            let fid = match self.ctx.typ(target).kind {
                TypeKind::Flat(fid) => fid,
                _ => {
                    return Err(self.grammar(format!("`{target_name}` flat definition not found")))
                }
            };
            while !self.eat(&TokenKind::RBrace) {
                if *self.peek() == TokenKind::Eof {
                    return Err(self.grammar("unexpected end of input"));
                }
                let n = self.get_name("member")?;
                self.eat_terminator();
                let src = self.ctx.flat(fid).find(&n).ok_or_else(|| {
                    self.grammar(format!("`{n}` is not a member of `{target_name}`"))
                })?;
                let mut fld = Field::new(n, src.typ);
                fld.index = src.index;
                flt.fields.push(fld);
            }
        }
        Ok(flt)
    }

    fn get_enumerator(&mut self, flt: &Flat) -> Result<Field, CompileError> {
        let n = self.get_name("enumerator")?;
        let value = if self.eat(&TokenKind::Colon) {
            self.get_number()?
        } else {
            flt.fields.last().map(|f| f.value + 1).unwrap_or(0)
        };
        self.eat_terminator();
        let mut fld = Field::new(n, None);
        fld.value = value;
        Ok(fld)
    }

    fn get_enumeration(&mut self, name: &str) -> Result<Flat, CompileError> {
        let mut flt = Flat::new(FlatKind::Enumeration, name);
        self.expect_token(TokenKind::LBrace, "'{' expected")?;
        while !self.eat(&TokenKind::RBrace) {
            if *self.peek() == TokenKind::Eof {
                return Err(self.grammar("unexpected end of input"));
            }
            let mut fld = self.get_enumerator(&flt)?;
            fld.index = flt.fields.len() as u32;
            flt.fields.push(fld);
        }
        Ok(flt)
    }

    fn get_message(&mut self, name: &str) -> Result<Flat, CompileError> {
        let of = self.get_name("keyword")?;
        if of != "of" {
            return Err(self.grammar("'of' expected"));
        }
        let target_name = self.get_name("flat")?;
        let target = match self.ctx.find(&target_name) {
            Some(t) => t,
            None => self.ctx.placeholder(&target_name),
        };
        let mut flt = Flat::new(FlatKind::Message, name);
        flt.underlying = Some(target);
        Ok(flt)
    }

    fn run(&mut self) -> Result<(), CompileError> {
        loop {
            if *self.peek() == TokenKind::Eof {
                break;
            }
            let n = self.get_name("declaration")?;
            if n == "end" {
                break;
            }
            log::debug!("parsing declaration `{n}`");

            let tid = match self.ctx.find(&n) {
                Some(t) => {
                    if !matches!(self.ctx.typ(t).kind, TypeKind::Undefined(_)) {
                        return Err(self.error(CompileErrorKind::Duplicate(n)));
                    }
                    t
                }
                None => self.ctx.placeholder(&n),
            };

            self.expect_token(TokenKind::Colon, "colon missing after global name")?;
            let s = self.get_name("declaration kind")?;
            let flt = match s.as_str() {
                "flat" => self.get_flat(&n, FlatKind::Flat)?,
                "variant" => self.get_flat(&n, FlatKind::Variant)?,
                "enum" => self.get_enumeration(&n)?,
                "view" => self.get_view(&n)?,
                "message" => self.get_message(&n)?,
                _ => {
                    return Err(self.grammar(format!("unexpected `{s}` at start of declaration")))
                }
            };
            self.eat_terminator();
            self.ctx.define(tid, flt);
        }
        self.resolve()
    }

    /// Whole-schema checks once every declaration is in: normalise optionals
    /// whose inner type was a forward reference, reject compositions that
    /// only became visible now, and report anything still undefined.
    fn resolve(&mut self) -> Result<(), CompileError> {
        for i in 0..self.ctx.types.len() {
            let kind = self.ctx.types[i].kind;
            match kind {
                TypeKind::Optional(inner) => {
                    let peeled = self.ctx.peel_arrays(inner);
                    match self.ctx.typ(peeled).kind {
                        TypeKind::Optional(_)
                        | TypeKind::Variant(_)
                        | TypeKind::Vector(_)
                        | TypeKind::String => {
                            // the inner already encodes presence
                            let replacement = self.ctx.typ(inner).clone();
                            self.ctx.types[i] = replacement;
                        }
                        TypeKind::Flat(fid) => {
                            self.ctx.flat_mut(fid).used_as_optional = true;
                        }
                        _ => {}
                    }
                }
                TypeKind::Vector(inner) => {
                    if let TypeKind::Variant(_) = self.ctx.typ(inner).kind {
                        return Err(CompileError::no_line(CompileErrorKind::Composition(
                            "vector of variant".into(),
                        )));
                    }
                }
                TypeKind::Varray(inner) => {
                    if let TypeKind::Variant(_) = self.ctx.typ(inner).kind {
                        return Err(CompileError::no_line(CompileErrorKind::Composition(
                            "fixed_vector of variant".into(),
                        )));
                    }
                }
                _ => {}
            }
        }

        let mut missing: Vec<&str> = self
            .ctx
            .types
            .iter()
            .filter(|t| matches!(t.kind, TypeKind::Undefined(_)))
            .map(|t| t.name.as_str())
            .collect();
        if !missing.is_empty() {
            missing.sort_unstable();
            return Err(CompileError::no_line(CompileErrorKind::Lingering(
                missing.join(", "),
            )));
        }

        for &fid in &self.ctx.order {
            let flt = self.ctx.flat(fid);
            if matches!(flt.kind, FlatKind::View | FlatKind::Message)
                && self.ctx.underlying_flat(fid).is_none()
            {
                return Err(CompileError::no_line(CompileErrorKind::Grammar(format!(
                    "`{}` flat definition not found",
                    flt.name
                ))));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn parse_ok(source: &str) -> Context {
        let mut ctx = Context::new();
        parse(&mut ctx, lex(source).unwrap()).unwrap();
        ctx
    }

    fn parse_err(source: &str) -> CompileError {
        let mut ctx = Context::new();
        parse(&mut ctx, lex(source).unwrap()).unwrap_err()
    }

    #[test]
    fn simple_flat() {
        let ctx = parse_ok("Pair : flat { x:int32 y:int32 }");
        let fid = ctx.order[0];
        let flt = ctx.flat(fid);
        assert_eq!(flt.kind, FlatKind::Flat);
        assert_eq!(flt.fields.len(), 2);
        assert_eq!(flt.fields[1].name, "y");
        assert_eq!(flt.fields[1].index, 1);
    }

    #[test]
    fn duplicate_declaration() {
        let err = parse_err("A : flat { x:int32 } A : flat { y:int32 }");
        assert_eq!(err.kind, CompileErrorKind::Duplicate("A".into()));
    }

    #[test]
    fn duplicate_member() {
        let err = parse_err("A : flat { x:int32 x:int32 }");
        assert_eq!(err.kind, CompileErrorKind::Duplicate("x".into()));
    }

    #[test]
    fn enumerator_values() {
        let ctx = parse_ok("E : enum { a b:5 c }");
        let flt = ctx.flat(ctx.order[0]);
        let values: Vec<i64> = flt.fields.iter().map(|f| f.value).collect();
        assert_eq!(values, vec![0, 5, 6]);
    }

    #[test]
    fn enumerator_reference() {
        let ctx = parse_ok("E : enum { a b:5 c } Other : flat { k:int32 = E::c }");
        let flt = ctx.flat(ctx.order[1]);
        assert_eq!(flt.fields[0].value, 6);
    }

    #[test]
    fn optional_collapses() {
        let ctx = parse_ok("A : flat { o : optional<optional<int32>> s : optional<string> }");
        let flt = ctx.flat(ctx.order[0]);
        let o = flt.fields[0].typ.unwrap();
        assert!(matches!(ctx.typ(o).kind, TypeKind::Optional(_)));
        // the inner optional was dropped
        let TypeKind::Optional(inner) = ctx.typ(o).kind else {
            panic!()
        };
        assert!(matches!(ctx.typ(inner).kind, TypeKind::Scalar { .. }));
        let s = flt.fields[1].typ.unwrap();
        assert_eq!(ctx.typ(s).kind, TypeKind::String);
    }

    #[test]
    fn vector_of_variant_rejected() {
        let err = parse_err("V : variant { i:int32 } A : flat { v : vector<V> }");
        assert!(matches!(err.kind, CompileErrorKind::Composition(_)));
    }

    #[test]
    fn forward_reference() {
        let ctx = parse_ok("A : flat { v : V } V : variant { i:int32 }");
        let a = ctx.flat(ctx.order[0]);
        let v = a.fields[0].typ.unwrap();
        assert!(matches!(ctx.typ(v).kind, TypeKind::Variant(_)));
    }

    #[test]
    fn lingering_undefined() {
        let err = parse_err("A : variant { b : Missing }");
        assert!(matches!(err.kind, CompileErrorKind::Lingering(_)));
    }

    #[test]
    fn deprecate_and_delete() {
        let ctx = parse_ok("A : flat { x:int32 y:int32 delete x deprecate y }");
        let flt = ctx.flat(ctx.order[0]);
        assert_eq!(flt.fields[0].status, Status::Deleted);
        assert_eq!(flt.fields[1].status, Status::Deprecated);
        assert_eq!(flt.fields[2].status, Status::Deleting);
        assert_eq!(flt.fields[3].status, Status::Deprecating);
        // ordinals are never reused
        assert_eq!(flt.fields[3].index, 3);
    }

    #[test]
    fn subset_view() {
        let ctx = parse_ok("F : flat { a:int32 b:int64 c:int8 } v : view of F { c a }");
        let view = ctx.flat(ctx.order[1]);
        assert_eq!(view.kind, FlatKind::View);
        assert_eq!(view.fields[0].name, "c");
        assert_eq!(view.fields[0].index, 2);
        assert_eq!(view.fields[1].name, "a");
        assert_eq!(view.fields[1].index, 0);
    }

    #[test]
    fn unknown_view_member() {
        let err = parse_err("F : flat { a:int32 } v : view of F { nope }");
        assert!(matches!(err.kind, CompileErrorKind::Grammar(_)));
    }

    #[test]
    fn sicko_parses() {
        let ctx = parse_ok("Sicko : flat { z : optional<vector<int32[10]>[20]>[30] }");
        let flt = ctx.flat(ctx.order[0]);
        let z = flt.fields[0].typ.unwrap();
        // outer [30]
        let TypeKind::Array(mid) = ctx.typ(z).kind else {
            panic!()
        };
        assert_eq!(ctx.typ(z).count, 30);
        // the optional collapsed onto the [20] array of vectors
        let TypeKind::Array(vec) = ctx.typ(mid).kind else {
            panic!()
        };
        assert_eq!(ctx.typ(mid).count, 20);
        assert!(matches!(ctx.typ(vec).kind, TypeKind::Vector(_)));
    }

    #[test]
    fn end_sentinel() {
        let ctx = parse_ok("A : flat { x:int32 } end ignored junk");
        assert_eq!(ctx.order.len(), 1);
    }
}
