//! rwou-talk
//!
//! The conversation engine of the WOU-era games: a bytecode interpreter
//! for the compiled talk scripts shipped in `converse.a`/`converse.b`.
//! A [`Session`] binds the game's collaborators, loads an actor's script,
//! and cooperatively steps the [`interpreter::Interpreter`] one tick at a
//! time, suspending whenever the script needs player input.

pub mod buffer;
pub mod config;
pub mod game;
pub mod interpreter;
pub mod opcode;
pub mod session;
pub mod test;

pub use buffer::ScriptBuffer;
pub use config::{TalkConfig, TalkConfigBuilder, TalkConfigReader};
pub use game::{GameKind, GameWorld, PlayerInput, Presenter, Stat, TimeOfDay};
pub use interpreter::{Interpreter, VmState, WaitReason};
pub use opcode::{classify, ControlOp, OpKind, ValOp, Width};
pub use session::{var, Session};
