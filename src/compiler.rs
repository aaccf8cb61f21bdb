//! Compiles a spec-string — the terse textual grammar for describing a wire
//! format inline — into a [`Spec`] tree.
//!
//! Two stages, same split the grammar itself draws: [`tokenize`] turns the
//! character stream into a flat token list, and [`Builder`] walks that list
//! once, left to right, maintaining just enough state (a pending number, a
//! pending sign, an open-frame stack for `(...)`/`{...}` nesting, and a FIFO
//! of declared-but-unreferenced variable names) to produce a tree — no
//! backtracking, no lookahead beyond a single token.

use std::collections::{BTreeMap, HashSet, VecDeque};

use crate::endian::Endian;
use crate::error::{CompileError, CompileErrorKind};
use crate::intcodec::{IntSpec, Width};
use crate::spec::Spec;

/// Compile a spec-string with no name prefix.
pub fn compile(input: &str) -> Result<Spec, CompileError> {
    compile_with_prefix(input, "")
}

/// Compile a spec-string, prepending `prefix` to every auto-generated
/// variable name. Lets callers compose several spec-strings into one
/// format without their `"0"`, `"1"`, … names colliding.
pub fn compile_with_prefix(input: &str, prefix: impl Into<String>) -> Result<Spec, CompileError> {
    let tokens = tokenize(input)?;
    let mut builder = Builder::new(prefix.into());
    builder.run(&tokens)?;
    builder.finish()
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(u64),
    Width(Width),
    Skip,
    Bytes,
    Variable,
    UntilStart,
    UntilEnd,
    SwitchStart,
    SwitchEnd,
    Equals,
    Star,
    Comma,
    Plus,
    Minus,
    Dollar,
    Endian(Endian),
}

fn tokenize(input: &str) -> Result<Vec<Token>, CompileError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            continue;
        }

        match c {
            '0'..='9' => {
                if c == '0' && matches!(chars.peek(), Some('x') | Some('X')) {
                    chars.next();
                    let mut value = 0u64;
                    let mut any = false;
                    while let Some(&d) = chars.peek() {
                        match d.to_digit(16) {
                            Some(digit) => {
                                value = value * 16 + digit as u64;
                                any = true;
                                chars.next();
                            }
                            None => break,
                        }
                    }
                    if any {
                        tokens.push(Token::Number(value));
                    } else {
                        // Bare "0x" with nothing after it: the "0" and the
                        // "x" are emitted as their own tokens instead.
                        tokens.push(Token::Number(0));
                        tokens.push(Token::Skip);
                    }
                    continue;
                }

                let mut acc = (c as u8 - b'0') as u64;
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() {
                        acc = acc * 10 + (d as u8 - b'0') as u64;
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Number(acc));
            }
            '<' => tokens.push(Token::Endian(Endian::Little)),
            '>' => tokens.push(Token::Endian(Endian::Big)),
            'b' | 'B' => tokens.push(Token::Width(Width::One)),
            'h' | 'H' => tokens.push(Token::Width(Width::Two)),
            't' | 'T' => tokens.push(Token::Width(Width::Three)),
            'i' | 'I' => tokens.push(Token::Width(Width::Four)),
            'q' | 'Q' => tokens.push(Token::Width(Width::Eight)),
            'x' | 'X' => tokens.push(Token::Skip),
            's' | 'S' => tokens.push(Token::Bytes),
            '%' => tokens.push(Token::Variable),
            '(' => tokens.push(Token::UntilStart),
            ')' => tokens.push(Token::UntilEnd),
            '{' => tokens.push(Token::SwitchStart),
            '}' => tokens.push(Token::SwitchEnd),
            '=' => tokens.push(Token::Equals),
            '*' => tokens.push(Token::Star),
            ',' => tokens.push(Token::Comma),
            '+' => tokens.push(Token::Plus),
            '-' => tokens.push(Token::Minus),
            '$' => tokens.push(Token::Dollar),
            other => {
                return Err(CompileError::new(
                    CompileErrorKind::DanglingToken,
                    format!("unrecognized character {other:?} in spec-string"),
                ))
            }
        }
    }

    Ok(tokens)
}

#[derive(Clone, Debug)]
enum CaseLabel {
    Value(u64),
    Default,
}

#[derive(Clone, Debug)]
enum Frame {
    Until {
        name: Option<String>,
        items: Vec<Spec>,
    },
    Switch {
        name: String,
        cases: BTreeMap<u64, Spec>,
        default: Option<Spec>,
        label: Option<CaseLabel>,
        items: Vec<Spec>,
    },
}

struct Builder {
    prefix: String,
    endian: Endian,
    auto_counter: u64,
    declared: HashSet<String>,
    fifo: VecDeque<String>,
    pending_number: Option<u64>,
    pending_sign: Option<i64>,
    stashed_offset: Option<i64>,
    pending_dollar: Option<u64>,
    star_pending: bool,
    var_pending: bool,
    stack: Vec<Frame>,
    output: Vec<Spec>,
}

impl Builder {
    fn new(prefix: String) -> Self {
        Self {
            prefix,
            endian: Endian::Little,
            auto_counter: 0,
            declared: HashSet::new(),
            fifo: VecDeque::new(),
            pending_number: None,
            pending_sign: None,
            stashed_offset: None,
            pending_dollar: None,
            star_pending: false,
            var_pending: false,
            stack: Vec::new(),
            output: Vec::new(),
        }
    }

    fn run(&mut self, tokens: &[Token]) -> Result<(), CompileError> {
        let mut i = 0;
        while i < tokens.len() {
            match &tokens[i] {
                Token::Endian(e) => self.endian = *e,

                Token::Number(n) => {
                    if self.var_pending && self.pending_sign.is_some() {
                        let sign = self.pending_sign.take().unwrap();
                        self.pending_number = None;
                        self.pending_dollar = None;
                        self.pending_offset_from(sign, *n);
                    } else if tokens.get(i + 1) == Some(&Token::Dollar) {
                        self.pending_dollar = Some(*n);
                        i += 1;
                    } else {
                        self.pending_number = Some(*n);
                    }
                }

                Token::Plus => {
                    if !self.var_pending {
                        return Err(dangling("'+' outside a variable declaration"));
                    }
                    self.pending_sign = Some(1);
                }

                Token::Minus => {
                    if !self.var_pending {
                        return Err(dangling("'-' outside a variable declaration"));
                    }
                    self.pending_sign = Some(-1);
                }

                Token::Variable => {
                    self.var_pending = true;
                    self.pending_sign = None;
                }

                Token::Width(width) => {
                    if self.var_pending {
                        if self.pending_number.take().is_some() {
                            return Err(dangling("unexpected number in variable declaration"));
                        }
                        let offset = self.take_offset();
                        let int_spec = IntSpec::new(*width, self.endian);
                        let name = self.declare_auto_name();
                        self.emit(Spec::Variable(int_spec, name, offset));
                        self.var_pending = false;
                    } else {
                        let repeat = self.pending_number.take().unwrap_or(1);
                        let int_spec = IntSpec::new(*width, self.endian);
                        for _ in 0..repeat {
                            self.emit(Spec::Integer(int_spec));
                        }
                    }
                }

                Token::Skip => {
                    let n = self
                        .pending_number
                        .take()
                        .ok_or_else(|| dangling("'x' with no preceding count"))?;
                    self.emit(Spec::Skip(n));
                }

                Token::Bytes => {
                    let name = self.resolve_optional_name("'s'")?;
                    self.emit(Spec::Bytes(name));
                }

                Token::UntilStart => {
                    let name = self.resolve_optional_name("'('")?;
                    self.stack.push(Frame::Until {
                        name,
                        items: Vec::new(),
                    });
                }

                Token::UntilEnd => match self.stack.pop() {
                    Some(Frame::Until { name, items }) => {
                        let inner = combine(items);
                        self.emit(Spec::Until(name, Box::new(inner)));
                    }
                    Some(other) => {
                        self.stack.push(other);
                        return Err(unmatched("')' does not close a '('"));
                    }
                    None => return Err(unmatched("')' with no matching '('")),
                },

                Token::SwitchStart => {
                    let name = self.resolve_required_name("'{'")?;
                    self.stack.push(Frame::Switch {
                        name,
                        cases: BTreeMap::new(),
                        default: None,
                        label: None,
                        items: Vec::new(),
                    });
                }

                Token::Equals => match self.stack.last_mut() {
                    Some(Frame::Switch { label, .. }) => {
                        *label = Some(self.take_case_label()?);
                    }
                    _ => return Err(invalid_label("'=' outside a switch case")),
                },

                Token::Comma => self.finish_case(false)?,

                Token::SwitchEnd => {
                    self.finish_case(true)?;
                    match self.stack.pop() {
                        Some(Frame::Switch {
                            name,
                            cases,
                            default,
                            ..
                        }) => {
                            if cases.is_empty() && default.is_none() {
                                return Err(CompileError::new(
                                    CompileErrorKind::EmptySwitch,
                                    "switch has no cases",
                                ));
                            }
                            let default = default.unwrap_or(Spec::Stop);
                            self.emit(Spec::Switch(name, cases, Box::new(default)));
                        }
                        Some(other) => {
                            self.stack.push(other);
                            return Err(unmatched("'}' does not close a '{'"));
                        }
                        None => return Err(unmatched("'}' with no matching '{'")),
                    }
                }

                Token::Star => self.star_pending = true,

                Token::Dollar => return Err(dangling("'$' with no preceding number")),
            }

            i += 1;
        }

        Ok(())
    }

    fn finish(mut self) -> Result<Spec, CompileError> {
        if !self.stack.is_empty() {
            return Err(CompileError::new(
                CompileErrorKind::UnbalancedDelimiter,
                "unterminated '(' or '{'",
            ));
        }
        if self.var_pending
            || self.pending_number.is_some()
            || self.pending_sign.is_some()
            || self.stashed_offset.is_some()
            || self.pending_dollar.is_some()
            || self.star_pending
        {
            return Err(dangling("trailing incomplete token at end of spec-string"));
        }

        Ok(combine(std::mem::take(&mut self.output)))
    }

    fn pending_offset_from(&mut self, sign: i64, n: u64) {
        self.stashed_offset = Some(sign * n as i64);
    }

    fn take_offset(&mut self) -> i64 {
        self.stashed_offset.take().unwrap_or(0)
    }

    fn take_case_label(&mut self) -> Result<CaseLabel, CompileError> {
        if self.star_pending {
            self.star_pending = false;
            return Ok(CaseLabel::Default);
        }
        match self.pending_number.take() {
            Some(n) => Ok(CaseLabel::Value(n)),
            None => Err(invalid_label("'=' with no preceding case label")),
        }
    }

    fn finish_case(&mut self, closing: bool) -> Result<(), CompileError> {
        match self.stack.last_mut() {
            Some(Frame::Switch {
                cases,
                default,
                label,
                items,
                ..
            }) => {
                if label.is_none() && items.is_empty() {
                    if closing {
                        return Ok(());
                    }
                    return Err(invalid_label("',' with no preceding case"));
                }
                let label = label
                    .take()
                    .ok_or_else(|| invalid_label("case body with no label"))?;
                let spec = combine(std::mem::take(items));
                match label {
                    CaseLabel::Value(n) => {
                        cases.insert(n, spec);
                    }
                    CaseLabel::Default => *default = Some(spec),
                }
                Ok(())
            }
            _ => {
                if closing {
                    Ok(())
                } else {
                    Err(dangling("',' outside a switch"))
                }
            }
        }
    }

    fn resolve_optional_name(&mut self, what: &str) -> Result<Option<String>, CompileError> {
        if self.star_pending {
            self.star_pending = false;
            return Ok(None);
        }
        if let Some(idx) = self.pending_dollar.take() {
            return self.name_by_index(idx).map(Some);
        }
        match self.fifo.pop_front() {
            Some(name) => Ok(Some(name)),
            None => Err(dangling(&format!(
                "{what} with no preceding '%' declaration"
            ))),
        }
    }

    fn resolve_required_name(&mut self, what: &str) -> Result<String, CompileError> {
        if self.star_pending {
            return Err(dangling(&format!("'*' is not valid before {what}")));
        }
        if let Some(idx) = self.pending_dollar.take() {
            return self.name_by_index(idx);
        }
        self.fifo
            .pop_front()
            .ok_or_else(|| dangling(&format!("{what} with no preceding '%' declaration")))
    }

    fn name_by_index(&self, idx: u64) -> Result<String, CompileError> {
        let name = format!("{}{idx}", self.prefix);
        if self.declared.contains(&name) {
            Ok(name)
        } else {
            Err(CompileError::new(
                CompileErrorKind::UndeclaredVariableIndex,
                format!("'{idx}$' references a variable that was never declared"),
            ))
        }
    }

    fn declare_auto_name(&mut self) -> String {
        let name = format!("{}{}", self.prefix, self.auto_counter);
        self.auto_counter += 1;
        self.declared.insert(name.clone());
        self.fifo.push_back(name.clone());
        name
    }

    fn emit(&mut self, spec: Spec) {
        match self.stack.last_mut() {
            Some(Frame::Until { items, .. }) => items.push(spec),
            Some(Frame::Switch { items, .. }) => items.push(spec),
            None => self.output.push(spec),
        }
    }
}

fn dangling(message: &str) -> CompileError {
    CompileError::new(CompileErrorKind::DanglingToken, message)
}

fn unmatched(message: &str) -> CompileError {
    CompileError::new(CompileErrorKind::UnmatchedClose, message)
}

fn invalid_label(message: &str) -> CompileError {
    CompileError::new(CompileErrorKind::InvalidCaseLabel, message)
}

/// `combine([])` = `Skip(0)`; `combine([s])` = `s`; otherwise `Seq(list)`.
fn combine(specs: Vec<Spec>) -> Spec {
    Spec::seq(specs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn big_endian_tower() {
        let spec = compile(">BHIQ").unwrap();
        assert_eq!(
            spec,
            Spec::seq(vec![
                Spec::integer(IntSpec::new(Width::One, Endian::Big)),
                Spec::integer(IntSpec::new(Width::Two, Endian::Big)),
                Spec::integer(IntSpec::new(Width::Four, Endian::Big)),
                Spec::integer(IntSpec::new(Width::Eight, Endian::Big)),
            ])
        );
    }

    #[test]
    fn integer_repeat() {
        let spec = compile("3I").unwrap();
        let one = Spec::integer(IntSpec::new(Width::Four, Endian::Little));
        assert_eq!(spec, Spec::seq(vec![one.clone(), one.clone(), one]));
    }

    #[test]
    fn length_prefixed_bytes() {
        let spec = compile("<%Is").unwrap();
        assert_eq!(
            spec,
            Spec::seq(vec![
                Spec::variable(IntSpec::new(Width::Four, Endian::Little), "0", 0),
                Spec::bytes("0"),
            ])
        );
    }

    #[test]
    fn unbounded_bytes() {
        let spec = compile("*s").unwrap();
        assert_eq!(spec, Spec::bytes_unbounded());
    }

    #[test]
    fn until_with_fixed_budget() {
        let spec = compile("<%B(I)").unwrap();
        assert_eq!(
            spec,
            Spec::seq(vec![
                Spec::variable(IntSpec::new(Width::One, Endian::Little), "0", 0),
                Spec::until("0", Spec::integer(IntSpec::new(Width::Four, Endian::Little))),
            ])
        );
    }

    #[test]
    fn switch_with_default() {
        let spec = compile("<%B{0=B,1=H,*=H}").unwrap();
        let le = |w| Spec::integer(IntSpec::new(w, Endian::Little));
        assert_eq!(
            spec,
            Spec::seq(vec![
                Spec::variable(IntSpec::new(Width::One, Endian::Little), "0", 0),
                Spec::switch("0", vec![(0, le(Width::One)), (1, le(Width::Two))], le(Width::Two)),
            ])
        );
    }

    #[test]
    fn negative_offset() {
        let spec = compile("%-6I").unwrap();
        assert_eq!(
            spec,
            Spec::variable(IntSpec::new(Width::Four, Endian::Little), "0", -6)
        );
    }

    #[test]
    fn dollar_index_override_does_not_advance_fifo() {
        // Declares "0", references it explicitly via "0$s" (bypassing the
        // FIFO), then a second plain "s" still finds "0" sitting at the
        // front of the FIFO — the override never popped it.
        let spec = compile("%I 0$s s").unwrap();
        assert_eq!(
            spec,
            Spec::seq(vec![
                Spec::variable(IntSpec::new(Width::Four, Endian::Little), "0", 0),
                Spec::bytes("0"),
                Spec::bytes("0"),
            ])
        );
    }

    #[test]
    fn dollar_index_to_undeclared_variable_errors() {
        let err = compile("5$s").unwrap_err();
        assert_eq!(err.kind(), CompileErrorKind::UndeclaredVariableIndex);
    }

    #[test]
    fn unterminated_until_errors() {
        let err = compile("%B(I").unwrap_err();
        assert_eq!(err.kind(), CompileErrorKind::UnbalancedDelimiter);
    }

    #[test]
    fn empty_switch_errors() {
        let err = compile("%B{}").unwrap_err();
        assert_eq!(err.kind(), CompileErrorKind::EmptySwitch);
    }

    #[test]
    fn nested_unbounded_until() {
        let spec = compile("<%B(I *(B))").unwrap();
        let inner = Spec::seq(vec![
            Spec::integer(IntSpec::new(Width::Four, Endian::Little)),
            Spec::until_unbounded(Spec::integer(IntSpec::new(Width::One, Endian::Little))),
        ]);
        assert_eq!(
            spec,
            Spec::seq(vec![
                Spec::variable(IntSpec::new(Width::One, Endian::Little), "0", 0),
                Spec::until("0", inner),
            ])
        );
    }
}
