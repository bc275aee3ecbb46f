use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use cadence_core::Value;

use crate::ast::{BinaryOp, Expr, Func, Root, UnaryOp};
use crate::lexer::Token;

type Span = SimpleSpan;

/// Parse error with source span.
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Byte range of the offending input.
    pub span: std::ops::Range<usize>,
    /// Human-readable description.
    pub message: String,
}

enum Postfix {
    Attr(String),
    Index(Expr),
}

/// Build the expression parser.
///
/// Precedence, tightest first: postfix access (`.`, `[]`), prefix `-`/`not`,
/// `* / %`, `+ -`, comparisons, `and`, `or`. All infix levels are
/// left-associative.
fn expr_parser<'a, I>() -> impl Parser<'a, I, Expr, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = Span>,
{
    recursive(|expr| {
        let kw = |k: &'static str| select! { Token::Word(ref w) if w.as_str() == k => () }.labelled(k);
        let name = select! { Token::Word(w) => w }.labelled("name");

        let literal = select! {
            Token::Integer(n) => Value::Integer(n),
            Token::Float(x) => Value::Float(x),
            Token::Str(s) => Value::String(s),
            Token::Word(ref w) if w.as_str() == "true" => Value::Boolean(true),
            Token::Word(ref w) if w.as_str() == "false" => Value::Boolean(false),
            Token::Word(ref w) if w.as_str() == "null" => Value::Null,
        }
        .map(Expr::Literal)
        .labelled("literal");

        let items = expr
            .clone()
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<Expr>>();

        let list = items
            .clone()
            .delimited_by(just(Token::LBracket), just(Token::RBracket))
            .map(Expr::List)
            .labelled("list");

        // Function names are checked after the argument list so that a bare
        // root word never produces a misleading "unknown function" error.
        let call = name
            .clone()
            .then(items.delimited_by(just(Token::LParen), just(Token::RParen)))
            .try_map(|(word, args), span| {
                let func = Func::from_name(&word)
                    .ok_or_else(|| Rich::custom(span, format!("unknown function `{word}`")))?;
                if args.len() != func.arity() {
                    return Err(Rich::custom(
                        span,
                        format!(
                            "`{func}` takes {} argument(s), got {}",
                            func.arity(),
                            args.len()
                        ),
                    ));
                }
                Ok(Expr::Call { func, args })
            })
            .labelled("function call");

        let root = name
            .clone()
            .try_map(|word, span| {
                Root::from_name(&word).map(Expr::Root).ok_or_else(|| {
                    Rich::custom(
                        span,
                        format!("unknown name `{word}` (expected sim, parent, or timestamp)"),
                    )
                })
            })
            .labelled("sim, parent, or timestamp");

        let parens = expr
            .clone()
            .delimited_by(just(Token::LParen), just(Token::RParen));

        let atom = choice((literal, list, call, root, parens)).boxed();

        let postfix = choice((
            just(Token::Dot).ignore_then(name).map(Postfix::Attr),
            expr.clone()
                .delimited_by(just(Token::LBracket), just(Token::RBracket))
                .map(Postfix::Index),
        ));

        let access = atom
            .foldl(postfix.repeated(), |target, op| match op {
                Postfix::Attr(attr) => Expr::attr(target, attr),
                Postfix::Index(index) => Expr::index(target, index),
            })
            .boxed();

        let unary = choice((
            just(Token::Minus).to(UnaryOp::Neg),
            kw("not").to(UnaryOp::Not),
        ))
        .repeated()
        .foldr(access, Expr::unary)
        .boxed();

        let product = unary
            .clone()
            .foldl(
                choice((
                    just(Token::Star).to(BinaryOp::Mul),
                    just(Token::Slash).to(BinaryOp::Div),
                    just(Token::Percent).to(BinaryOp::Rem),
                ))
                .then(unary)
                .repeated(),
                |lhs, (op, rhs)| Expr::binary(op, lhs, rhs),
            )
            .boxed();

        let sum = product
            .clone()
            .foldl(
                choice((
                    just(Token::Plus).to(BinaryOp::Add),
                    just(Token::Minus).to(BinaryOp::Sub),
                ))
                .then(product)
                .repeated(),
                |lhs, (op, rhs)| Expr::binary(op, lhs, rhs),
            )
            .boxed();

        let comparison = sum
            .clone()
            .foldl(
                choice((
                    just(Token::EqEq).to(BinaryOp::Eq),
                    just(Token::NotEq).to(BinaryOp::Ne),
                    just(Token::Le).to(BinaryOp::Le),
                    just(Token::Lt).to(BinaryOp::Lt),
                    just(Token::Ge).to(BinaryOp::Ge),
                    just(Token::Gt).to(BinaryOp::Gt),
                ))
                .then(sum)
                .repeated(),
                |lhs, (op, rhs)| Expr::binary(op, lhs, rhs),
            )
            .boxed();

        let conjunction = comparison
            .clone()
            .foldl(
                kw("and").to(BinaryOp::And).then(comparison).repeated(),
                |lhs, (op, rhs)| Expr::binary(op, lhs, rhs),
            )
            .boxed();

        conjunction.clone().foldl(
            kw("or").to(BinaryOp::Or).then(conjunction).repeated(),
            |lhs, (op, rhs)| Expr::binary(op, lhs, rhs),
        )
    })
}

/// Parse a token stream into a single expression. Trailing tokens are an
/// error.
pub fn parse(
    tokens: &[(Token, std::ops::Range<usize>)],
    source_len: usize,
) -> Result<Expr, Vec<ParseError>> {
    let token_iter = tokens
        .iter()
        .map(|(tok, span)| (tok.clone(), Span::from(span.clone())));

    let eoi: Span = (source_len..source_len).into();
    let stream = Stream::from_iter(token_iter).map(eoi, |(t, s): (_, _)| (t, s));

    let (output, errors) = expr_parser()
        .then_ignore(end())
        .parse(stream)
        .into_output_errors();

    if let Some(ast) = output
        && errors.is_empty()
    {
        return Ok(ast);
    }

    Err(errors
        .into_iter()
        .map(|e| ParseError {
            span: e.span().into_range(),
            message: e.to_string(),
        })
        .collect())
}
