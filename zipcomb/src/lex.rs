//! Helpers for parsing text directly, one `char` per token.

use unicode_segmentation::UnicodeSegmentation;

use crate::{
    continuation::Continuation,
    cursor::Cursor,
    error::Mismatch,
    parser::Parser,
    parsers::{rest, satisfy, sequence},
    scope::{RestMatch, Scope},
};

pub fn chars(input: &str) -> Cursor<char> {
    Cursor::new(input.chars().collect::<Vec<_>>())
}

pub fn parse_str<P>(parser: &P, input: &str) -> Continuation<char, (), P::Error, P::Expression>
where
    P: Parser<Token = char, Context = ()> + ?Sized,
{
    parser.parse(chars(input), ())
}

pub fn any<C: Clone>() -> impl Parser<Token = char, Context = C, Error = Mismatch, Expression = char> {
    satisfy("any character", |_: &char| true)
}

pub fn digit<C: Clone>() -> impl Parser<Token = char, Context = C, Error = Mismatch, Expression = char>
{
    satisfy("digit", |c: &char| c.is_ascii_digit())
}

pub fn whitespace<C: Clone>(
) -> impl Parser<Token = char, Context = C, Error = Mismatch, Expression = char> {
    satisfy("whitespace", |c: &char| c.is_whitespace())
}

pub fn literal<C: Clone>(
    word: &str,
) -> impl Parser<Token = char, Context = C, Error = Mismatch, Expression = String> {
    let word: Vec<char> = word.chars().collect();
    sequence(word).map(|cs: Vec<char>| cs.into_iter().collect::<String>())
}

/// Case-insensitive `literal`. The matched text is returned as it appears in the input.
pub fn ignore_case<C: Clone>(
    word: &str,
) -> impl Parser<Token = char, Context = C, Error = Mismatch, Expression = String> {
    let expected: Vec<char> = word.chars().collect();
    rest(format!("`{word}` (any case)"), move |input: &[char]| {
        let same = |a: &char, b: &char| a.to_lowercase().eq(b.to_lowercase());
        match expected.iter().zip(input).position(|(a, b)| !same(a, b)) {
            Some(i) => RestMatch::Mismatched(i),
            None if input.len() < expected.len() => RestMatch::Mismatched(input.len()),
            None => RestMatch::Matched(expected.len()),
        }
    })
    .map(|cs: Vec<char>| cs.into_iter().collect::<String>())
}

/// `\r\n` or `\n`.
pub fn line_separator<C: Clone>(
) -> impl Parser<Token = char, Context = C, Error = Mismatch, Expression = String> {
    literal("\r\n")
        .or(literal("\n"))
        .map_err(|(_, lf): (Mismatch, Mismatch)| Mismatch {
            expected: "line separator".to_string(),
            ..lf
        })
}

pub fn skip_whitespace<C: Clone>(s: &mut Scope<char, C>) -> usize {
    s.skip_while(|c| c.is_whitespace())
}

/// 1-based `(row, column)` of the `index`th char of `input`. Columns count grapheme
/// clusters, so a combining sequence is one column.
pub fn position(input: &str, index: isize) -> (usize, usize) {
    let Ok(index) = usize::try_from(index) else {
        return (1, 1);
    };
    let end = input
        .char_indices()
        .nth(index)
        .map(|(byte, _)| byte)
        .unwrap_or(input.len());
    let before = &input[..end];
    let row = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let col = before[line_start..].graphemes(true).count() + 1;
    (row, col)
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_digits() {
        let p = digit::<()>().repeat_some();
        let res = parse_str(&p, "42x");
        assert_eq!(res.cursor().map(|c| c.index()), Some(2));
        assert_eq!(res.into_result(), Ok(vec!['4', '2']));

        let err = parse_str(&p, "x").into_result().unwrap_err();
        assert_eq!(err.to_string(), "expected digit at position 0, found x");
    }

    #[test]
    fn test_literal() {
        let p = literal::<()>("let");
        assert_eq!(parse_str(&p, "let x").into_result(), Ok("let".to_string()));

        let err = parse_str(&p, "lex").into_result().unwrap_err();
        assert_eq!(err.index, 2);
        assert_eq!(err.found.as_deref(), Some("x"));
    }

    #[test]
    fn test_literal_outlives_word() {
        let keywords: Vec<_> = ["if", "else"]
            .iter()
            .map(|k| {
                let owned = k.to_uppercase();
                literal::<()>(&owned)
            })
            .collect();
        assert_eq!(parse_str(&keywords[1], "ELSE").into_result(), Ok("ELSE".to_string()));
        assert!(parse_str(&keywords[0], "IN").into_result().is_err());
    }

    #[test]
    fn test_ignore_case() {
        let p = ignore_case::<()>("quit");
        assert_eq!(parse_str(&p, "QuIt").into_result(), Ok("QuIt".to_string()));
        assert!(parse_str(&p, "qui").is_err());
    }

    #[test]
    fn test_line_separator() {
        let p = line_separator::<()>();
        assert_eq!(parse_str(&p, "\r\nx").cursor().map(|c| c.index()), Some(2));
        assert_eq!(parse_str(&p, "\nx").cursor().map(|c| c.index()), Some(1));

        let err = parse_str(&p, "x").into_result().unwrap_err();
        assert_eq!(err.expected, "line separator");
        assert_eq!(err.index, 0);
    }

    #[test]
    fn test_any_and_whitespace() {
        let p = whitespace::<()>().repeat_many().then(any());
        assert_eq!(parse_str(&p, "  z").into_result(), Ok((vec![' ', ' '], 'z')));
        assert!(parse_str(&any::<()>(), "").is_err());
    }

    #[test]
    fn test_skip_whitespace() {
        let mut s = Scope::new(chars(" \t 1"), ());
        assert_eq!(skip_whitespace(&mut s), 3);
        assert_eq!(s.cursor().peek(), Some(&'1'));
    }

    #[test]
    fn test_position() {
        let input = "1 +\n  2 * e\u{301}x";
        assert_eq!(position(input, 0), (1, 1));
        assert_eq!(position(input, 2), (1, 3));
        assert_eq!(position(input, 4), (2, 1));
        assert_eq!(position(input, 6), (2, 3));
        // `e` + combining accent is a single column
        assert_eq!(position(input, 12), (2, 8));
        assert_eq!(position(input, 100), (2, 9));
        assert_eq!(position(input, -1), (1, 1));
    }
}
