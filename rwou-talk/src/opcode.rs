//! Talk script opcode tables.
//!
//! A script byte belongs to exactly one band: printable text, a width
//! marker for an immediate value, an expression operator, or a statement
//! opcode. [`classify`] sorts a byte into its band; everything the tables
//! do not claim is either a bare value or an unknown statement, and the
//! interpreter treats both as harmless.

/// Statement opcodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ControlOp {
    /// 0xa1 run the block up to the matching else/endif when the
    /// condition is non-zero
    If = 0xa1,
    /// 0xa2 close the innermost block
    EndIf = 0xa2,
    /// 0xa3 flip the innermost if block
    Else = 0xa3,
    /// 0xa4 set an actor flag
    SetFlag = 0xa4,
    /// 0xa5 clear an actor flag
    ClearFlag = 0xa5,
    /// 0xa6 declare the variable the next assign or input targets
    Decl = 0xa6,
    /// 0xa8 assign an expression to the declared variable
    Assign = 0xa8,
    /// 0xb0 jump to an absolute script offset, dropping open blocks
    Jump = 0xb0,
    /// 0xb6 end the conversation
    Bye = 0xb6,
    /// 0xb9 create an object in an inventory
    New = 0xb9,
    /// 0xba destroy an object in an inventory
    Delete = 0xba,
    /// 0xbe open the inventory display
    Inventory = 0xbe,
    /// 0xbf show an actor's portrait
    Portrait = 0xbf,
    /// 0xc4 raise player karma
    AddKarma = 0xc4,
    /// 0xc5 lower player karma
    SubKarma = 0xc5,
    /// 0xc9 move objects between inventories
    Give = 0xc9,
    /// 0xcb pause until the page is acknowledged
    Wait = 0xcb,
    /// 0xcd set an actor's work type
    WorkType = 0xcd,
    /// 0xd8 remember an actor's name for later $Y substitution
    SetName = 0xd8,
    /// 0xd9 heal an actor
    Heal = 0xd9,
    /// 0xdb cure an actor's poison
    Cure = 0xdb,
    /// 0xee close the innermost answer block
    EndAnswer = 0xee,
    /// 0xef match the statement text keywords against the last input
    Keywords = 0xef,
    /// 0xf1 section marker: the look description
    Look = 0xf1,
    /// 0xf2 section marker: the conversation body
    Converse = 0xf2,
    /// 0xf3 section marker: keyword prefix table
    Prefix = 0xf3,
    /// 0xf6 run the block when the last keyword match hit
    Answer = 0xf6,
    /// 0xf7 wait for a line of input
    Ask = 0xf7,
    /// 0xf8 wait for one character out of the statement text
    AskChar = 0xf8,
    /// 0xfb wait for a line of input into the declared variable
    Input = 0xfb,
    /// 0xfc wait for digits into the declared variable
    InputNum = 0xfc,
    /// 0xff script header: the actor this script belongs to
    Ident = 0xff,
}

/// Expression operators and state queries. These run against the value
/// stack when a statement's operand list is evaluated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ValOp {
    /// 0x81 greater than
    Gt = 0x81,
    /// 0x82 greater than or equal
    Ge = 0x82,
    /// 0x83 less than
    Lt = 0x83,
    /// 0x84 less than or equal
    Le = 0x84,
    /// 0x85 not equal
    Ne = 0x85,
    /// 0x86 equal
    Eq = 0x86,
    /// 0x90 add
    Add = 0x90,
    /// 0x91 subtract
    Sub = 0x91,
    /// 0x92 multiply
    Mul = 0x92,
    /// 0x94 logical or
    LogicalOr = 0x94,
    /// 0x95 logical and
    LogicalAnd = 0x95,
    /// 0x9a weight an actor can still carry
    CanCarry = 0x9a,
    /// 0x9b weight of an object stack
    Weight = 0x9b,
    /// 0xa0 random number in an inclusive range
    Rand = 0xa0,
    /// 0xa7 expression terminator
    Eval = 0xa7,
    /// 0xab actor flag test
    Flag = 0xab,
    /// 0xb2 numeric variable read
    Var = 0xb2,
    /// 0xb3 string variable read
    StrVar = 0xb3,
    /// 0xb4 indexed read from a script data table
    Data = 0xb4,
    /// 0xbb count of an object in an inventory
    ObjCount = 0xbb,
    /// 0xc6 actor is in the party
    InParty = 0xc6,
    /// 0xc7 object is somewhere in the party
    ObjInParty = 0xc7,
    /// 0xd7 actor is close to the conversation
    NpcNearby = 0xd7,
    /// 0xda actor is wounded
    Wounded = 0xda,
    /// 0xdc actor is poisoned
    Poisoned = 0xdc,
    /// 0xdd actor id of a party slot
    PartyNpc = 0xdd,
    /// 0xe0 add an actor's experience
    Exp = 0xe0,
    /// 0xe1 add an actor's level
    Level = 0xe1,
    /// 0xe2 add an actor's strength
    Str = 0xe2,
    /// 0xe3 add an actor's intelligence
    Int = 0xe3,
    /// 0xe4 add an actor's dexterity
    Dex = 0xe4,
}

/// Width of an immediate value, announced by the marker byte before it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Width {
    One,
    Two,
    Four,
}

impl Width {
    pub fn bytes(self) -> usize {
        match self {
            Width::One => 1,
            Width::Two => 2,
            Width::Four => 4,
        }
    }
}

/// A script byte, classified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpKind {
    /// Newline or the visible ASCII band; accumulates into statement text.
    Print,
    /// Width marker; the immediate value follows.
    DataSize(Width),
    /// Expression operator.
    Value(ValOp),
    /// Statement opcode.
    Control(ControlOp),
    /// In the statement band but not a known opcode; consumed alone.
    UnknownControl,
    /// Below the statement band with no other meaning; collected as a
    /// bare value.
    Literal,
}

/// First byte of the statement band.
pub const CTRL_BASE: u8 = 0xa1;

/// Argument placeholder for whichever actor the conversation targets.
pub const NPC_SELF: u32 = 0xeb;

pub fn classify(b: u8) -> OpKind {
    if b == 0x0a || (0x20..=0x7a).contains(&b) {
        return OpKind::Print;
    }
    match b {
        0xd3 => return OpKind::DataSize(Width::One),
        0xd4 => return OpKind::DataSize(Width::Two),
        0xd2 => return OpKind::DataSize(Width::Four),
        _ => {}
    }
    if let Ok(v) = ValOp::try_from(b) {
        return OpKind::Value(v);
    }
    if b >= CTRL_BASE {
        match ControlOp::try_from(b) {
            Ok(c) => OpKind::Control(c),
            Err(()) => OpKind::UnknownControl,
        }
    } else {
        OpKind::Literal
    }
}

impl TryFrom<u8> for ControlOp {
    type Error = ();

    fn try_from(b: u8) -> Result<Self, Self::Error> {
        let op = match b {
            0xa1 => Self::If,
            0xa2 => Self::EndIf,
            0xa3 => Self::Else,
            0xa4 => Self::SetFlag,
            0xa5 => Self::ClearFlag,
            0xa6 => Self::Decl,
            0xa8 => Self::Assign,
            0xb0 => Self::Jump,
            0xb6 => Self::Bye,
            0xb9 => Self::New,
            0xba => Self::Delete,
            0xbe => Self::Inventory,
            0xbf => Self::Portrait,
            0xc4 => Self::AddKarma,
            0xc5 => Self::SubKarma,
            0xc9 => Self::Give,
            0xcb => Self::Wait,
            0xcd => Self::WorkType,
            0xd8 => Self::SetName,
            0xd9 => Self::Heal,
            0xdb => Self::Cure,
            0xee => Self::EndAnswer,
            0xef => Self::Keywords,
            0xf1 => Self::Look,
            0xf2 => Self::Converse,
            0xf3 => Self::Prefix,
            0xf6 => Self::Answer,
            0xf7 => Self::Ask,
            0xf8 => Self::AskChar,
            0xfb => Self::Input,
            0xfc => Self::InputNum,
            0xff => Self::Ident,
            _ => return Err(()),
        };
        Ok(op)
    }
}

impl TryFrom<u8> for ValOp {
    type Error = ();

    fn try_from(b: u8) -> Result<Self, Self::Error> {
        let op = match b {
            0x81 => Self::Gt,
            0x82 => Self::Ge,
            0x83 => Self::Lt,
            0x84 => Self::Le,
            0x85 => Self::Ne,
            0x86 => Self::Eq,
            0x90 => Self::Add,
            0x91 => Self::Sub,
            0x92 => Self::Mul,
            0x94 => Self::LogicalOr,
            0x95 => Self::LogicalAnd,
            0x9a => Self::CanCarry,
            0x9b => Self::Weight,
            0xa0 => Self::Rand,
            0xa7 => Self::Eval,
            0xab => Self::Flag,
            0xb2 => Self::Var,
            0xb3 => Self::StrVar,
            0xb4 => Self::Data,
            0xbb => Self::ObjCount,
            0xc6 => Self::InParty,
            0xc7 => Self::ObjInParty,
            0xd7 => Self::NpcNearby,
            0xda => Self::Wounded,
            0xdc => Self::Poisoned,
            0xdd => Self::PartyNpc,
            0xe0 => Self::Exp,
            0xe1 => Self::Level,
            0xe2 => Self::Str,
            0xe3 => Self::Int,
            0xe4 => Self::Dex,
            _ => return Err(()),
        };
        Ok(op)
    }
}

impl ControlOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::If => "if",
            Self::EndIf => "endif",
            Self::Else => "else",
            Self::SetFlag => "setf",
            Self::ClearFlag => "clearf",
            Self::Decl => "decl",
            Self::Assign => "assign",
            Self::Jump => "jump",
            Self::Bye => "bye",
            Self::New => "new",
            Self::Delete => "delete",
            Self::Inventory => "inventory",
            Self::Portrait => "portrait",
            Self::AddKarma => "addkarma",
            Self::SubKarma => "subkarma",
            Self::Give => "give",
            Self::Wait => "wait",
            Self::WorkType => "worktype",
            Self::SetName => "setname",
            Self::Heal => "heal",
            Self::Cure => "cure",
            Self::EndAnswer => "endanswer",
            Self::Keywords => "keywords",
            Self::Look => "look",
            Self::Converse => "converse",
            Self::Prefix => "prefix",
            Self::Answer => "answer",
            Self::Ask => "ask",
            Self::AskChar => "askc",
            Self::Input => "input",
            Self::InputNum => "inputnum",
            Self::Ident => "ident",
        }
    }
}

impl ValOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Ne => "ne",
            Self::Eq => "eq",
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::LogicalOr => "or",
            Self::LogicalAnd => "and",
            Self::CanCarry => "cancarry",
            Self::Weight => "weight",
            Self::Rand => "rand",
            Self::Eval => "eval",
            Self::Flag => "flag",
            Self::Var => "var",
            Self::StrVar => "svar",
            Self::Data => "data",
            Self::ObjCount => "objcount",
            Self::InParty => "inparty",
            Self::ObjInParty => "objinparty",
            Self::NpcNearby => "nearby",
            Self::Wounded => "wounded",
            Self::Poisoned => "poisoned",
            Self::PartyNpc => "npc",
            Self::Exp => "exp",
            Self::Level => "lvl",
            Self::Str => "str",
            Self::Int => "int",
            Self::Dex => "dex",
        }
    }
}
