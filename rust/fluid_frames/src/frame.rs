use thiserror::Error;

use crate::args::BackendFormat;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEnd { expected: &'static str },
    #[error("line {line}, column {column}: expected {expected}, found {found:?}")]
    UnexpectedChar {
        line: usize,
        column: usize,
        expected: &'static str,
        found: char,
    },
    #[error("line {line}, column {column}: invalid integer literal {literal:?}")]
    InvalidInteger {
        line: usize,
        column: usize,
        literal: String,
    },
    #[error("line {line}, column {column}: trailing input after the frame array")]
    TrailingInput { line: usize, column: usize },
    #[error("expected an array of frames, each an array of rows of integers")]
    WrongDepth,
    #[error("frame {frame}, row {row}: expected {expected} values, found {found}")]
    RaggedRow {
        frame: usize,
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error(
        "frame {frame} is {}x{}, previous frames are {}x{}",
        .found.0, .found.1, .expected.0, .expected.1
    )]
    FrameSizeMismatch {
        frame: usize,
        expected: (u32, u32),
        found: (u32, u32),
    },
    #[error("line {line}: expected {expected} values, found {found}")]
    ElementCount {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("frame side length {size} is too large")]
    FrameTooLarge { size: usize },
    #[error("frame {frame}: pixel value {value} is outside 0..=255")]
    OutOfRange { frame: usize, value: i64 },
}

/// One greyscale image, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Frame {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[allow(unused)]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    #[allow(unused)]
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.pixels.chunks(self.width.max(1) as usize)
    }

    fn from_values(
        frame: usize,
        width: usize,
        height: usize,
        values: impl IntoIterator<Item = i64>,
    ) -> Result<Self, ParseError> {
        let pixels = values
            .into_iter()
            .map(|value| {
                u8::try_from(value)
                    .map_err(|_| ParseError::OutOfRange { frame, value })
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug_assert_eq!(pixels.len(), width * height);

        Ok(Self {
            width: width as u32,
            height: height as u32,
            pixels,
        })
    }
}

pub fn parse(
    format: BackendFormat,
    input: &str,
) -> Result<Vec<Frame>, ParseError> {
    let frames = match format {
        BackendFormat::Futhark => parse_futhark(input)?,
        BackendFormat::C => parse_c(input)?,
    };

    if let Some(first) = frames.first() {
        let expected = (first.width, first.height);
        for (idx, frame) in frames.iter().enumerate() {
            let found = (frame.width, frame.height);
            if found != expected {
                return Err(ParseError::FrameSizeMismatch {
                    frame: idx,
                    expected,
                    found,
                });
            }
        }
    }

    Ok(frames)
}

/// First line is the side length `n`, every following line holds one
/// frame as `n * n` whitespace separated values.
pub fn parse_c(input: &str) -> Result<Vec<Frame>, ParseError> {
    let mut lines = input.trim().lines().enumerate();

    let size_line = lines
        .next()
        .map(|(_, line)| line.trim())
        .filter(|line| !line.is_empty())
        .ok_or(ParseError::UnexpectedEnd {
            expected: "frame size",
        })?;
    let size = size_line.parse::<usize>().map_err(|_| {
        ParseError::InvalidInteger {
            line: 1,
            column: 1,
            literal: size_line.to_string(),
        }
    })?;

    let pixel_count = u32::try_from(size)
        .ok()
        .and_then(|_| size.checked_mul(size))
        .ok_or(ParseError::FrameTooLarge { size })?;

    let mut frames = vec![];
    for (idx, line) in lines {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let values = line
            .split_whitespace()
            .map(|word| {
                word.parse::<i64>().map_err(|_| ParseError::InvalidInteger {
                    line: line_no,
                    column: column_of(line, word),
                    literal: word.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if values.len() != pixel_count {
            return Err(ParseError::ElementCount {
                line: line_no,
                expected: pixel_count,
                found: values.len(),
            });
        }

        frames.push(Frame::from_values(frames.len(), size, size, values)?);
    }

    Ok(frames)
}

fn column_of(line: &str, word: &str) -> usize {
    word.as_ptr() as usize - line.as_ptr() as usize + 1
}

#[derive(Debug, Clone, PartialEq)]
enum Literal {
    Int(i64),
    Array(Vec<Literal>),
}

/// Whole input is a single three dimensional array literal
/// (frames, rows, values).
pub fn parse_futhark(input: &str) -> Result<Vec<Frame>, ParseError> {
    let mut parser = LiteralParser { src: input, pos: 0 };
    let literal = parser.value()?;
    parser.skip_whitespace();
    if parser.pos < input.len() {
        let (line, column) = parser.location(parser.pos);
        return Err(ParseError::TrailingInput { line, column });
    }

    let Literal::Array(frames) = literal else {
        return Err(ParseError::WrongDepth);
    };

    frames
        .into_iter()
        .enumerate()
        .map(|(frame_idx, frame)| {
            let Literal::Array(rows) = frame else {
                return Err(ParseError::WrongDepth);
            };
            let rows = rows
                .into_iter()
                .map(|row| match row {
                    Literal::Array(values) => values
                        .into_iter()
                        .map(|it| match it {
                            Literal::Int(v) => Ok(v),
                            Literal::Array(_) => Err(ParseError::WrongDepth),
                        })
                        .collect::<Result<Vec<_>, _>>(),
                    Literal::Int(_) => Err(ParseError::WrongDepth),
                })
                .collect::<Result<Vec<_>, _>>()?;

            let width = rows.first().map_or(0, Vec::len);
            for (row_idx, row) in rows.iter().enumerate() {
                if row.len() != width {
                    return Err(ParseError::RaggedRow {
                        frame: frame_idx,
                        row: row_idx,
                        expected: width,
                        found: row.len(),
                    });
                }
            }

            let height = rows.len();
            Frame::from_values(
                frame_idx,
                width,
                height,
                rows.into_iter().flatten(),
            )
        })
        .collect()
}

struct LiteralParser<'a> {
    src: &'a str,
    pos: usize,
}

impl LiteralParser<'_> {
    const INT_SUFFIXES: [&'static str; 8] =
        ["i8", "i16", "i32", "i64", "u8", "u16", "u32", "u64"];

    fn location(&self, pos: usize) -> (usize, usize) {
        let before = &self.src[..pos];
        let line = before.matches('\n').count() + 1;
        let column = before
            .rfind('\n')
            .map_or(before.chars().count(), |nl| {
                before[nl + 1..].chars().count()
            })
            + 1;
        (line, column)
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.src[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        match self.peek() {
            Some(found) => {
                let (line, column) = self.location(self.pos);
                ParseError::UnexpectedChar {
                    line,
                    column,
                    expected,
                    found,
                }
            }
            None => ParseError::UnexpectedEnd { expected },
        }
    }

    fn expect(
        &mut self,
        ch: char,
        expected: &'static str,
    ) -> Result<(), ParseError> {
        self.skip_whitespace();
        if self.peek() == Some(ch) {
            self.pos += ch.len_utf8();
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn value(&mut self) -> Result<Literal, ParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some('[') => self.array(),
            Some('e') => self.empty(),
            Some(ch) if ch == '-' || ch.is_ascii_digit() => self.int(),
            _ => Err(self.unexpected("'[' or an integer")),
        }
    }

    fn array(&mut self) -> Result<Literal, ParseError> {
        self.expect('[', "'['")?;
        let mut items = vec![];

        self.skip_whitespace();
        if self.peek() == Some(']') {
            self.pos += 1;
            return Ok(Literal::Array(items));
        }

        loop {
            items.push(self.value()?);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(']') => {
                    self.pos += 1;
                    return Ok(Literal::Array(items));
                }
                _ => return Err(self.unexpected("',' or ']'")),
            }
        }
    }

    /// `empty([0][16][16]i32)`, the shape annotation is not needed.
    fn empty(&mut self) -> Result<Literal, ParseError> {
        if !self.src[self.pos..].starts_with("empty") {
            return Err(self.unexpected("'[' or an integer"));
        }
        self.pos += "empty".len();
        self.expect('(', "'('")?;

        let close = self.src[self.pos..]
            .find(')')
            .ok_or(ParseError::UnexpectedEnd { expected: "')'" })?;
        self.pos += close + 1;

        Ok(Literal::Array(vec![]))
    }

    fn int(&mut self) -> Result<Literal, ParseError> {
        let start = self.pos;
        let len = self.src[start..]
            .char_indices()
            .find(|&(idx, ch)| {
                !(ch.is_ascii_alphanumeric() || (idx == 0 && ch == '-'))
            })
            .map_or(self.src.len() - start, |(idx, _)| idx);
        self.pos += len;

        let literal = &self.src[start..self.pos];
        let digits = Self::INT_SUFFIXES
            .iter()
            .find_map(|suffix| literal.strip_suffix(suffix))
            .unwrap_or(literal);

        digits
            .parse::<i64>()
            .map(Literal::Int)
            .map_err(|_| {
                let (line, column) = self.location(start);
                ParseError::InvalidInteger {
                    line,
                    column,
                    literal: literal.to_string(),
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn c_format() {
        let frames = parse(BackendFormat::C, "2\n1 2 3 4\n").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(
            frames[0].rows().collect::<Vec<_>>(),
            vec![&[1_u8, 2][..], &[3, 4][..]]
        );
    }

    #[test]
    fn c_format_multiple_frames() {
        let input = "  3\n0 0 0 1 1 1 2 2 2\n\n9  8 7 6 5 4 3 2   1  \n";
        let frames = parse_c(input).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].width(), 3);
        assert_eq!(frames[1].height(), 3);
        assert_eq!(frames[1].pixels(), &[9, 8, 7, 6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn c_format_errors() {
        assert_eq!(
            parse_c(""),
            Err(ParseError::UnexpectedEnd {
                expected: "frame size"
            })
        );
        assert_eq!(
            parse_c("2\n1 2 3"),
            Err(ParseError::ElementCount {
                line: 2,
                expected: 4,
                found: 3
            })
        );
        assert_eq!(
            parse_c("2\n1 2 x 4"),
            Err(ParseError::InvalidInteger {
                line: 2,
                column: 5,
                literal: "x".to_string()
            })
        );
        assert_eq!(
            parse_c("4294967296\n1"),
            Err(ParseError::FrameTooLarge { size: 4_294_967_296 })
        );
        assert_eq!(
            parse_c(&format!("{}\n1", usize::MAX)),
            Err(ParseError::FrameTooLarge { size: usize::MAX })
        );
        assert_eq!(
            parse_c("1\n256"),
            Err(ParseError::OutOfRange {
                frame: 0,
                value: 256
            })
        );
    }

    #[test]
    fn futhark_format() {
        let input = "[[[0i32, 1i32], [2i32, 3i32]],\n [[255i32, 254i32], [0i32, 7i32]]]\n";
        let frames = parse(BackendFormat::Futhark, input).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].pixels(), &[0, 1, 2, 3]);
        assert_eq!(frames[1].pixels(), &[255, 254, 0, 7]);
        assert_eq!((frames[1].width(), frames[1].height()), (2, 2));
    }

    #[test]
    fn futhark_format_without_suffix() {
        let frames = parse_futhark("[[[1, 2, 3]]]").unwrap();
        assert_eq!((frames[0].width(), frames[0].height()), (3, 1));
    }

    #[test]
    fn futhark_empty() {
        assert_eq!(parse_futhark("empty([0][4][4]i32)\n").unwrap(), vec![]);
        assert_eq!(parse_futhark("[]").unwrap(), vec![]);
    }

    #[test]
    fn futhark_errors() {
        assert_eq!(
            parse_futhark("[[[1, 2], [3]]]"),
            Err(ParseError::RaggedRow {
                frame: 0,
                row: 1,
                expected: 2,
                found: 1
            })
        );
        assert_eq!(parse_futhark("[[1, 2]]"), Err(ParseError::WrongDepth));
        assert_eq!(
            parse_futhark("[[[1]]] [[[2]]]"),
            Err(ParseError::TrailingInput { line: 1, column: 9 })
        );
        assert_eq!(
            parse_futhark("[[[1,\n 2f32]]]"),
            Err(ParseError::InvalidInteger {
                line: 2,
                column: 2,
                literal: "2f32".to_string()
            })
        );
        assert_eq!(
            parse_futhark("[[[1 2]]]"),
            Err(ParseError::UnexpectedChar {
                line: 1,
                column: 6,
                expected: "',' or ']'",
                found: '2'
            })
        );
        assert_eq!(
            parse_futhark("[[[-1i32]]]"),
            Err(ParseError::OutOfRange {
                frame: 0,
                value: -1
            })
        );
        assert!(matches!(
            parse_futhark("__import__('os')"),
            Err(ParseError::UnexpectedChar { .. })
        ));
    }

    #[test]
    fn mismatched_frames() {
        assert_eq!(
            parse(BackendFormat::Futhark, "[[[1]], [[1, 2], [3, 4]]]"),
            Err(ParseError::FrameSizeMismatch {
                frame: 1,
                expected: (1, 1),
                found: (2, 2)
            })
        );
    }
}
