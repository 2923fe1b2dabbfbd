use std::collections::HashMap;
use std::fmt;

use crate::config::{LexMode, MachineConfig, Region, RegionKind, Syntax};
use crate::error::{Error, Fault, Result};
use crate::io::Io;
use crate::lexer::{Lexed, Lexer};
use crate::machine::Machine;
use crate::opcode::Opcode;
use crate::ops;
use crate::table::TokenTable;
use crate::translate::{self, Instruction};

/// Executes one opcode, or runs as a hook around a run.
///
/// Handlers run with the instruction pointer on their own instruction; the
/// engine advances it by one afterwards.
pub type Handler = fn(&mut Machine, &mut Io<'_>) -> std::result::Result<(), Fault>;

/// Extension points invoked around the core loop.
#[derive(Clone, Copy, Default)]
pub struct Hooks {
    /// Once before the first instruction.
    pub pre_run: Option<Handler>,
    /// After every executed instruction.
    pub step: Option<Handler>,
    /// Once after the program ran off its end.
    pub post_run: Option<Handler>,
}

/// A concrete language: its tokens, machine parameters and behaviour.
///
/// Dialects are immutable once built; variations are new dialects.
#[derive(Clone)]
pub struct Dialect {
    name: String,
    table: TokenTable,
    config: MachineConfig,
    syntax: Syntax,
    handlers: HashMap<Opcode, Handler>,
    hooks: Hooks,
}

impl fmt::Debug for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialect")
            .field("name", &self.name)
            .field("table", &self.table)
            .field("config", &self.config)
            .field("syntax", &self.syntax)
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Dialect {
    pub fn builder(name: impl Into<String>, table: TokenTable) -> DialectBuilder {
        DialectBuilder {
            dialect: Dialect {
                name: name.into(),
                table,
                config: MachineConfig::default(),
                syntax: Syntax::default(),
                handlers: HashMap::new(),
                hooks: Hooks::default(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &TokenTable {
        &self.table
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn syntax(&self) -> &Syntax {
        &self.syntax
    }

    pub fn hooks(&self) -> Hooks {
        self.hooks
    }

    /// Handler bound to `op`, if the dialect overrides or extends it.
    pub fn handler(&self, op: Opcode) -> Option<Handler> {
        self.handlers.get(&op).copied()
    }

    pub fn lex(&self, source: &str) -> Result<Lexed> {
        Lexer::new(&self.table, &self.syntax).lex(source)
    }

    /// Lex and translate `source` into a program.
    pub fn compile(&self, source: &str) -> Result<Vec<Instruction>> {
        let lexed = self.lex(source)?;
        translate::translate(&self.table, &lexed.tokens)
    }

    /// Render `program` as source text of this dialect.
    pub fn render(&self, program: &[Instruction]) -> Result<String> {
        translate::to_source(&self.table, &self.syntax, program)
    }

    /// A copy of this dialect running on a different machine configuration.
    pub fn with_config(&self, config: MachineConfig) -> Result<Self> {
        config.validate()?;
        let mut dialect = self.clone();
        dialect.config = config;
        Ok(dialect)
    }

    /// A copy of this dialect with every opcode's tokens replaced, in order.
    pub fn with_tokens<S: AsRef<str>>(&self, name: impl Into<String>, tokens: &[S]) -> Result<Self> {
        let mut dialect = self.clone();
        dialect.name = name.into();
        dialect.table.replace_tokens(tokens)?;
        Ok(dialect)
    }
}

/// Convert `source` written in `from` into the surface syntax of `to`.
pub fn convert(from: &Dialect, to: &Dialect, source: &str) -> Result<String> {
    let program = from.compile(source)?;
    to.render(&program)
}

/// Assembles a [`Dialect`].
pub struct DialectBuilder {
    dialect: Dialect,
}

impl DialectBuilder {
    pub fn config(mut self, config: MachineConfig) -> Self {
        self.dialect.config = config;
        self
    }

    pub fn separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dialect.syntax.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    pub fn mode(mut self, mode: LexMode) -> Self {
        self.dialect.syntax.mode = mode;
        self
    }

    pub fn region(mut self, open: Opcode, close: Opcode, kind: RegionKind) -> Self {
        self.dialect.syntax.regions.push(Region { open, close, kind });
        self
    }

    /// Bind `op` to `handler`, overriding the built-in behaviour of core
    /// opcodes and the standard handler of extension opcodes.
    pub fn handler(mut self, op: Opcode, handler: Handler) -> Self {
        self.dialect.handlers.insert(op, handler);
        self
    }

    pub fn pre_run(mut self, hook: Handler) -> Self {
        self.dialect.hooks.pre_run = Some(hook);
        self
    }

    pub fn step(mut self, hook: Handler) -> Self {
        self.dialect.hooks.step = Some(hook);
        self
    }

    pub fn post_run(mut self, hook: Handler) -> Self {
        self.dialect.hooks.post_run = Some(hook);
        self
    }

    /// Validate and finish. Extension opcodes in the table without a handler
    /// get their standard one.
    pub fn build(mut self) -> Result<Dialect> {
        let dialect = &mut self.dialect;
        dialect.config.validate()?;
        if dialect.table.is_empty() {
            return Err(Error::Config(format!("dialect {} has no opcodes", dialect.name)));
        }
        if dialect.syntax.mode == LexMode::Delimited && !dialect.syntax.regions.is_empty() {
            return Err(Error::Config(
                "literal and comment regions need scan mode".to_string(),
            ));
        }
        for region in &dialect.syntax.regions {
            for op in [region.open, region.close] {
                if !dialect.table.contains(op) {
                    return Err(Error::UnknownOpcode(op));
                }
            }
        }
        let missing: Vec<Opcode> = dialect
            .table
            .opcodes()
            .filter(|op| !op.is_core() && !dialect.handlers.contains_key(op))
            .collect();
        for op in missing {
            let handler = ops::standard(op).ok_or(Error::MissingHandler(op))?;
            dialect.handlers.insert(op, handler);
        }
        Ok(self.dialect)
    }
}
