//! Built-in dialects.
//!
//! Every constructor builds a fresh [`Dialect`]. Apart from `brainfuck`
//! itself, each one is a token reskin of the same machine, optionally with
//! extension opcodes, hooks or a different machine configuration.

use crate::config::{EdgePolicy, MachineConfig, OutputMode, RegionKind};
use crate::dialect::{Dialect, DialectBuilder};
use crate::error::{Error, Fault, Result};
use crate::io::Io;
use crate::machine::Machine;
use crate::opcode::{CORE, Opcode};
use crate::ops;
use crate::sync;
use crate::table::TokenTable;
use crate::translate::Instruction;

/// Prints `Hello World!\n` with 8-bit cells.
pub const HELLO_WORLD: &str = ">+++++++++[<++++++++>-]<.>+++++++[<++++>-]<+.+++++++..+++.[-]\
>++++++++[<++++>-]<.>+++++++++++[<+++++>-]<.>++++++++[<+++>-]<.+++.------.--------.[-]\
>++++++++[<++++>-]<+.[-]++++++++++.";

const NAMES: [&str; 15] = [
    "brainfuck",
    "ook",
    "braincrash",
    "commdis",
    "ut_u",
    "jojo",
    "kemono",
    "nagato",
    "nekomimi",
    "nyaruko",
    "tettette",
    "neko",
    "misa",
    "kq",
    "kapibara",
];

/// Names accepted by [`by_name`].
pub fn names() -> &'static [&'static str] {
    &NAMES
}

pub fn by_name(name: &str) -> Result<Dialect> {
    match name {
        "brainfuck" => brainfuck(),
        "ook" => ook(),
        "braincrash" => braincrash(),
        "commdis" => commdis(),
        "ut_u" => ut_u(),
        "jojo" => jojo(),
        "kemono" => kemono(),
        "nagato" => nagato(),
        "nekomimi" => nekomimi(),
        "nyaruko" => nyaruko(),
        "tettette" => tettette(),
        "neko" => neko(),
        "misa" => misa(),
        "kq" => kq(),
        "kapibara" => kapibara(),
        other => Err(Error::UnknownDialect(other.to_string())),
    }
}

/// Core opcodes in `nxt prv inc dec put get opn cls` order, one token each.
fn core(name: &str, tokens: [&str; 8]) -> Result<DialectBuilder> {
    Ok(Dialect::builder(name, TokenTable::core(tokens)?))
}

/// Core opcodes with several aliases each, canonical first.
fn aliased(name: &str, tokens: [&[&str]; 8]) -> Result<DialectBuilder> {
    let table = TokenTable::new(CORE.into_iter().zip(tokens.map(<[&str]>::to_vec)))?;
    Ok(Dialect::builder(name, table))
}

pub fn brainfuck() -> Result<Dialect> {
    core("brainfuck", [">", "<", "+", "-", ".", ",", "[", "]"])?.build()
}

pub fn ook() -> Result<Dialect> {
    core(
        "ook",
        [
            "Ook. Ook?",
            "Ook? Ook.",
            "Ook. Ook.",
            "Ook! Ook!",
            "Ook. Ook!",
            "Ook! Ook.",
            "Ook! Ook?",
            "Ook? Ook!",
        ],
    )?
    .separators([" "])
    .build()
}

// ─── BrainCrash family ─────────────────────────────────────────────

const GREETING: &str = "Hello, world!";

/// Seed the greeting at the start of the tape and, for a non-empty program,
/// step the pointer past it.
fn greet(m: &mut Machine, _: &mut Io<'_>) -> std::result::Result<(), Fault> {
    let (_, tape, program) = m.parts_mut();
    for (i, c) in GREETING.chars().enumerate() {
        tape.set_at(i, c as i64)?;
    }
    if !program.is_empty() {
        let mut seeded: Vec<Instruction> =
            std::iter::repeat_n(Instruction::from(Opcode::Nxt), GREETING.chars().count()).collect();
        seeded.append(program);
        *program = seeded;
    }
    Ok(())
}

/// Write cells from the pointer onwards until a zero cell.
fn drain(m: &mut Machine, io: &mut Io<'_>) -> std::result::Result<(), Fault> {
    let mode = m.dialect().config().output;
    let tape = m.tape_mut();
    for _ in 0..tape.len() {
        let value = tape.get();
        if value == 0 {
            break;
        }
        io.write_value(value, mode)?;
        tape.shift(1)?;
    }
    Ok(())
}

const BRAINCRASH_EXTRA: [(Opcode, &str); 4] = [
    (Opcode::Or, "|"),
    (Opcode::And, "&"),
    (Opcode::Not, "~"),
    (Opcode::Xor, "^"),
];

pub fn braincrash() -> Result<Dialect> {
    let base = CORE.into_iter().zip([">", "<", "+", "-", ".", ",", "[", "]"]);
    let table = TokenTable::new(
        base.chain(BRAINCRASH_EXTRA)
            .map(|(op, token)| (op, vec![token])),
    )?;
    Dialect::builder("braincrash", table)
        .pre_run(greet)
        .post_run(drain)
        .build()
}

pub fn commdis() -> Result<Dialect> {
    let opcodes = CORE.into_iter().chain(BRAINCRASH_EXTRA.map(|(op, _)| op)).chain([
        Opcode::Shl,
        Opcode::Shr,
        Opcode::Njm,
        Opcode::Pjm,
        Opcode::Zro,
        Opcode::Hom,
    ]);
    let tokens = [
        "ｱｱ…", "ｱｱ､", "ｱ…", "ｱ､", "ｴｯﾄ…", "ｴｯﾄ､", "ｻｾﾝ…", "ｯｽ…", "ｱｯ…", "ｱｯ､", "ｱﾉ…", "ｱﾉ､",
        "ｱｰ…", "ｱｰ､", "ｴ…", "ｴ､", "ｴｯ…", "ｴｯ?",
    ];
    let table = TokenTable::new(opcodes.zip(tokens).map(|(op, token)| (op, vec![token])))?;
    Dialect::builder("commdis", table)
        .config(MachineConfig {
            tape_size: 32767,
            ..Default::default()
        })
        .pre_run(greet)
        .post_run(drain)
        .build()
}

// ─── Ut_U ──────────────────────────────────────────────────────────

/// Write the token whose table position is the current cell, then the
/// separator.
fn utu_put(m: &mut Machine, io: &mut Io<'_>) -> std::result::Result<(), Fault> {
    let value = m.tape().get();
    let index = m.tape().ptr();
    let dialect = m.dialect();
    let token = usize::try_from(value)
        .ok()
        .and_then(|v| dialect.table().opcodes().nth(v))
        .and_then(|op| dialect.table().token_of(op, 0).ok())
        .ok_or(Fault::UnknownCell { index, value })?;
    io.write_str(token)?;
    io.write_str(dialect.syntax().separator())
}

/// Self-modifying: the program lives mirrored on the tape and 3-bit cells
/// index the opcode table.
pub fn ut_u() -> Result<Dialect> {
    let table = TokenTable::new([
        (Opcode::Nop, vec!["あうー"]),
        (Opcode::Inc, vec!["うっうー"]),
        (Opcode::Dec, vec!["ううー"]),
        (Opcode::Nxt, vec!["イエイ"]),
        (Opcode::Prv, vec!["おとく"]),
        (Opcode::Put, vec!["ハイ、ターッチ"]),
        (Opcode::Opn, vec!["かもー"]),
        (Opcode::Cls, vec!["かなーって"]),
    ])?;
    Dialect::builder("ut_u", table)
        .config(MachineConfig {
            cell_width: 3,
            wrap_cell: true,
            ..Default::default()
        })
        .separators([" "])
        .handler(Opcode::Put, utu_put)
        .pre_run(sync::sync_pre)
        .step(sync::sync_step)
        .build()
}

// ─── Reskins ───────────────────────────────────────────────────────

pub fn jojo() -> Result<Dialect> {
    aliased(
        "jojo",
        [
            &["スターフィンガ", "やれやれだぜ"],
            &["ロードローラ", "貧弱"],
            &["オラ"],
            &["無駄"],
            &["ハーミットパープル"],
            &["新手のスタンド使いか"],
            &["あ・・・ありのまま今起こったことを話すぜ"],
            &["ザ・ワールド"],
        ],
    )?
    .build()
}

pub fn kemono() -> Result<Dialect> {
    core(
        "kemono",
        [
            "たのしー！",
            "すごーい！",
            "たーのしー！",
            "すっごーい！",
            "なにこれなにこれ！",
            "おもしろーい！",
            "うわー！",
            "わーい！",
        ],
    )?
    .build()
}

/// Tokens are runs of ellipses told apart by length and split with `。`.
/// Its programs habitually step left of cell 0, so the pointer wraps.
pub fn nagato() -> Result<Dialect> {
    core(
        "nagato",
        [
            "………",
            "…………",
            "…",
            "……",
            "………………",
            "……………",
            "「",
            "」",
        ],
    )?
    .config(MachineConfig {
        edge: EdgePolicy::Wrap,
        ..Default::default()
    })
    .separators(["。"])
    .build()
}

pub fn nekomimi() -> Result<Dialect> {
    core(
        "nekomimi",
        [
            "ネコミミ！",
            "ネコミミモード",
            "おにいさま",
            "私のしもべー",
            "や・く・そ・く・よ",
            "フルフルフルムーン",
            "キスキス…",
            "キス…したくなっちゃった…",
        ],
    )?
    .build()
}

pub fn nyaruko() -> Result<Dialect> {
    core(
        "nyaruko",
        [
            "(」・ω・)」うー(／・ω・)／にゃー",
            "(」・ω・)」うー!!(／・ω・)／にゃー!!",
            "(」・ω・)」うー!(／・ω・)／にゃー!",
            "(」・ω・)」うー!!!(／・ω・)／にゃー!!!",
            "Let's＼(・ω・)／にゃー",
            "cosmic!",
            "CHAOS☆CHAOS!",
            "I WANNA CHAOS!",
        ],
    )?
    .build()
}

/// `ー…てー` stores its text on the tape, `{…}` is a comment, and
/// `put`/`get` advance the pointer.
pub fn tettette() -> Result<Dialect> {
    let table = TokenTable::new([
        (Opcode::Buf, vec!["ー"]),
        (Opcode::EndBuf, vec!["てー"]),
        (Opcode::Com, vec!["{"]),
        (Opcode::EndCom, vec!["}"]),
        (Opcode::Nxt, vec!["てってー"]),
        (Opcode::Prv, vec!["てっててー"]),
        (Opcode::Inc, vec!["ててー"]),
        (Opcode::Dec, vec!["てっー"]),
        (Opcode::Put, vec!["てってっー"]),
        (Opcode::Get, vec!["てってってー"]),
        (Opcode::Opn, vec!["てってっててー"]),
        (Opcode::Cls, vec!["てってってっー"]),
    ])?;
    Dialect::builder("tettette", table)
        .config(MachineConfig {
            tape_size: 65536,
            cell_width: 32,
            ..Default::default()
        })
        .region(Opcode::Buf, Opcode::EndBuf, RegionKind::Literal)
        .region(Opcode::Com, Opcode::EndCom, RegionKind::Comment)
        .handler(Opcode::Put, ops::put_advance)
        .handler(Opcode::Get, ops::get_advance)
        .build()
}

pub fn neko() -> Result<Dialect> {
    core(
        "neko",
        ["にゃっ", "にゃん", "にゃにゃ", "にゃー", "にゃ。", "にゃ、", "「", "」"],
    )?
    .build()
}

/// Plain Brainfuck plus Japanese aliases, so ordinary prose runs. Cells and
/// the pointer wrap.
pub fn misa() -> Result<Dialect> {
    aliased(
        "misa",
        [
            &[">", "→", "～", "ー"],
            &["<", "←", "★", "☆"],
            &["+", "あ", "ぁ", "お", "ぉ"],
            &["-", "っ", "ッ"],
            &[".", "！"],
            &[",", "？"],
            &["[", "「", "『"],
            &["]", "」", "』"],
        ],
    )?
    .config(MachineConfig {
        wrap_cell: true,
        edge: EdgePolicy::Wrap,
        ..Default::default()
    })
    .build()
}

/// Output is raw bytes so multi-byte text can be written a byte at a time.
pub fn kq() -> Result<Dialect> {
    aliased(
        "kq",
        [
            &["ﾀﾞｧｲｪｽ", "ｼｪﾘ"],
            &["ｲｪｽﾀﾞｧ", "ｼｴﾘ"],
            &["ﾀﾞｧﾀﾞｧ", "ﾀﾞｧ"],
            &["ｼｪﾘｼｪﾘ", "ﾀﾞｱ"],
            &["ｼｴﾘﾀﾞｧ", "ｲｪｽ"],
            &["ﾀﾞｧｼｴﾘ", "ｲｴｽ"],
            &["ｼｴﾘｲｪｽ", "!"],
            &["ｲｪｽｼｴﾘ", ","],
        ],
    )?
    .config(MachineConfig {
        output: OutputMode::Byte,
        ..Default::default()
    })
    .build()
}

pub fn kapibara() -> Result<Dialect> {
    core(
        "kapibara",
        [
            "のすのす",
            "もでーん",
            "キュルッ！",
            "もふっ！",
            "むぎゅっと",
            "グッ！！",
            "ぬっくし",
            "うっとり",
        ],
    )?
    .build()
}
