//! The incremental parser: drives a [`Spec`] against a [`ByteQueue`],
//! producing a [`Data`] tree without blocking and without copying payload
//! bytes.

use crate::bytequeue::ByteQueue;
use crate::data::{Data, Environment};
use crate::error::Incomplete;
use crate::spec::Spec;

/// One frame of the parser's execution stack.
///
/// The stack models a depth-first walk of the `Spec` tree: `Prepared` holds
/// work not yet started, `PartialSeq`/`PartialRepeat` hold work in progress
/// with its already-parsed children, and `Done` is the terminal state once
/// the top-level spec has fully parsed (or collapsed to a `Stop`).
#[derive(Clone, Debug)]
enum Frame {
    Prepared(Spec),
    PartialSeq(Vec<Data>, Vec<Spec>),
    PartialRepeat(Vec<Data>, u64, Spec),
    Done(Data),
}

/// Parses a [`Spec`] against bytes supplied incrementally.
///
/// A `Parser` owns a [`ByteQueue`], a variable [`Environment`], and an
/// execution stack; it is meant to live across many `supply`/`next` calls.
/// It is not `Sync`: callers must serialize `supply`/`next`/`reset` calls
/// themselves.
#[derive(Clone, Debug)]
pub struct Parser {
    initial: Spec,
    initial_vars: Environment,
    queue: ByteQueue,
    env: Environment,
    stack: Vec<Frame>,
}

impl Parser {
    /// Create a parser for `spec` with an empty initial environment.
    pub fn new(spec: Spec) -> Self {
        Self::with_initial_vars(spec, Environment::new())
    }

    /// Create a parser for `spec`, seeding its environment with `vars`.
    ///
    /// `vars` survives [`reset`](Self::reset): it describes variables known
    /// before parsing starts (e.g. ones threaded in from an enclosing
    /// format), not ones discovered while parsing.
    pub fn with_initial_vars(spec: Spec, vars: Environment) -> Self {
        Self {
            stack: vec![Frame::Prepared(spec.clone())],
            initial: spec,
            env: vars.clone(),
            initial_vars: vars,
            queue: ByteQueue::new(),
        }
    }

    /// Append a chunk of bytes to the input queue. Never blocks or fails.
    pub fn supply(&mut self, chunk: impl Into<bytes::Bytes>) {
        self.queue.append(chunk.into());
    }

    /// Attempt one full parse of the top-level spec.
    ///
    /// Returns `Ok(Data)` once the spec has fully parsed (which may be a
    /// `Data::Stop` if the input was rejected), or
    /// `Err(Incomplete(k))` if at least `k` more bytes are needed to make
    /// further progress. Calling `next` again after `Incomplete` resumes
    /// exactly where the previous call left off. Calling `next` again after
    /// a completed parse (without an intervening `reset`) returns the same
    /// cached result.
    pub fn next(&mut self) -> Result<Data, Incomplete> {
        loop {
            if let Some(data) = self.step()? {
                return Ok(data);
            }
        }
    }

    /// Re-initialize the execution stack to parse the top-level spec again,
    /// clearing any variables discovered during the previous parse (but
    /// keeping whatever was passed to [`with_initial_vars`](Self::with_initial_vars)).
    pub fn reset(&mut self) {
        self.stack = vec![Frame::Prepared(self.initial.clone())];
        self.env = self.initial_vars.clone();
    }

    /// Repeatedly `next()` + `reset()` until the parser stalls on
    /// `Incomplete`, a round makes no byte progress, or a `Stop` surfaces.
    /// Returns every successfully completed `Data` value; `Stop` is never
    /// included in the result (it only ends the loop).
    pub fn parse_all(&mut self) -> Vec<Data> {
        let mut out = Vec::new();

        loop {
            let before = self.queue.len();

            match self.next() {
                Ok(Data::Stop(_, _)) => break,
                Ok(data) => out.push(data),
                Err(_) => break,
            }

            self.reset();

            if self.queue.len() == before {
                break;
            }
        }

        out
    }

    /// The bytes supplied but not yet consumed by a completed parse step.
    pub fn remaining(&self) -> bytes::Bytes {
        self.queue
            .clone_prefix_as_view(self.queue.len())
            .unwrap_or_default()
            .to_bytes()
    }

    /// Perform one atomic transition of the top stack frame.
    ///
    /// Returns `Ok(Some(data))` once the parse has reached a terminal
    /// `Done`, `Ok(None)` if more steps remain, or `Err(Incomplete)` if the
    /// queue ran dry mid-step (the frame is restored so the next call picks
    /// up from the same point).
    fn step(&mut self) -> Result<Option<Data>, Incomplete> {
        let frame = self.stack.pop().expect("parser stack is never empty");

        match frame {
            Frame::Done(data) => {
                self.stack.push(Frame::Done(data.clone()));
                Ok(Some(data))
            }
            Frame::Prepared(spec) => self.step_prepared(spec),
            Frame::PartialSeq(done, mut remaining) => {
                if remaining.is_empty() {
                    Ok(self.complete(Data::Seq(done)))
                } else {
                    let next = remaining.remove(0);
                    self.stack.push(Frame::PartialSeq(done, remaining));
                    self.stack.push(Frame::Prepared(next));
                    Ok(None)
                }
            }
            Frame::PartialRepeat(done, remaining, inner) => {
                if remaining == 0 {
                    Ok(self.complete(Data::Seq(done)))
                } else {
                    self.stack
                        .push(Frame::PartialRepeat(done, remaining - 1, inner.clone()));
                    self.stack.push(Frame::Prepared(inner));
                    Ok(None)
                }
            }
        }
    }

    fn step_prepared(&mut self, spec: Spec) -> Result<Option<Data>, Incomplete> {
        match spec {
            Spec::Skip(n) => match self.queue.split_prefix(n as usize) {
                Ok(_) => Ok(self.complete(Data::Empty)),
                Err(deficit) => {
                    self.stack.push(Frame::Prepared(Spec::Skip(n)));
                    Err(Incomplete::new(deficit))
                }
            },

            Spec::Stop => Ok(self.collapse_to_stop(Spec::Stop, 0)),

            Spec::Integer(int_spec) => match self.queue.split_prefix(int_spec.width.bytes()) {
                Ok(view) => {
                    let value = int_spec.decode(&view.to_bytes());
                    Ok(self.complete(Data::Integer(value)))
                }
                Err(deficit) => {
                    self.stack.push(Frame::Prepared(Spec::Integer(int_spec)));
                    Err(Incomplete::new(deficit))
                }
            },

            Spec::Variable(int_spec, name, offset) => {
                match self.queue.split_prefix(int_spec.width.bytes()) {
                    Ok(view) => {
                        let raw = int_spec.decode(&view.to_bytes());
                        let adjusted = raw.wrapping_add(offset as u64);
                        self.env.set(name, adjusted);
                        Ok(self.complete(Data::Integer(adjusted)))
                    }
                    Err(deficit) => {
                        self.stack
                            .push(Frame::Prepared(Spec::Variable(int_spec, name, offset)));
                        Err(Incomplete::new(deficit))
                    }
                }
            }

            Spec::Bytes(name) => {
                let len = match &name {
                    Some(name) => self.env.require(name) as usize,
                    None => self.queue.len(),
                };

                match self.queue.split_prefix(len) {
                    Ok(view) => Ok(self.complete(Data::Bytes(view))),
                    Err(deficit) => {
                        self.stack.push(Frame::Prepared(Spec::Bytes(name)));
                        Err(Incomplete::new(deficit))
                    }
                }
            }

            Spec::Seq(mut items) => {
                if items.is_empty() {
                    return Ok(self.complete(Data::Seq(Vec::new())));
                }

                let first = items.remove(0);
                self.stack.push(Frame::PartialSeq(Vec::new(), items));
                self.stack.push(Frame::Prepared(first));
                Ok(None)
            }

            Spec::Repeat(name, inner) => {
                let count = self.env.require(&name);
                self.stack
                    .push(Frame::PartialRepeat(Vec::new(), count, *inner));
                Ok(None)
            }

            Spec::Until(name, inner) => self.step_until(name, *inner),

            Spec::Switch(name, cases, default) => {
                let tag = self.env.require(&name);
                let chosen = cases.get(&tag).cloned().unwrap_or_else(|| (*default).clone());

                if chosen == Spec::Stop {
                    Ok(self.collapse_to_stop(Spec::Switch(name, cases, default), tag))
                } else {
                    self.stack.push(Frame::Prepared(chosen));
                    Ok(None)
                }
            }
        }
    }

    /// Run a bounded sub-parse for `Until`: split the budget off the main
    /// queue, hand it to a fresh sub-[`Parser`] inheriting the current
    /// environment, and run it to exhaustion. The sub-parser's own
    /// `parse_all` already implements the "swallow a `Stop`, keep the
    /// successfully-parsed prefix" rule, and any budget residue it cannot
    /// use is simply dropped along with the sub-parser.
    fn step_until(&mut self, name: Option<String>, inner: Spec) -> Result<Option<Data>, Incomplete> {
        let budget = match &name {
            Some(name) => self.env.require(name) as usize,
            None => self.queue.len(),
        };

        let view = match self.queue.split_prefix(budget) {
            Ok(view) => view,
            Err(deficit) => {
                self.stack
                    .push(Frame::Prepared(Spec::Until(name, Box::new(inner))));
                return Err(Incomplete::new(deficit));
            }
        };

        let mut sub = Parser::with_initial_vars(inner, self.env.clone());
        sub.supply(view.to_bytes());
        let results = sub.parse_all();

        Ok(self.complete(Data::Seq(results)))
    }

    /// Merge a completed child's data into its parent frame, or — if the
    /// stack is already empty — finish the whole parse.
    fn complete(&mut self, data: Data) -> Option<Data> {
        match self.stack.pop() {
            None => {
                self.stack.push(Frame::Done(data.clone()));
                Some(data)
            }
            Some(Frame::PartialSeq(mut done, remaining)) => {
                done.push(data);
                self.stack.push(Frame::PartialSeq(done, remaining));
                None
            }
            Some(Frame::PartialRepeat(mut done, remaining, inner)) => {
                done.push(data);
                self.stack.push(Frame::PartialRepeat(done, remaining, inner));
                None
            }
            Some(other) => {
                self.stack.push(other);
                panic!("internal parser error: completed data with no pending parent frame");
            }
        }
    }

    /// Collapse the entire stack to a single terminal `Stop` value.
    fn collapse_to_stop(&mut self, spec: Spec, selector: u64) -> Option<Data> {
        let data = Data::Stop(spec, selector);
        self.stack.clear();
        self.stack.push(Frame::Done(data.clone()));
        Some(data)
    }
}
