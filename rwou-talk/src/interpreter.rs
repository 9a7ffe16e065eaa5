//! The conversation virtual machine.
//!
//! A talk script is a byte stream of statements. Each statement is an
//! optional opcode, a run of operand tokens (width-marked literals and
//! operator bytes), and a run of printable text. [`Interpreter::step`]
//! collects one statement and executes it; the session drives steps until
//! the machine reports waiting or stopped.
//!
//! Operand tokens form a postfix expression stream: literals push onto a
//! value stack, operator bytes apply to it, and 0xa7 closes one argument.
//! Game-state operators delegate to the session's collaborators, so the
//! interpreter holds no world state of its own.
//!
//! Decode faults never abort a conversation. An unknown statement byte, a
//! value-stack underflow, or a block close with nothing open is logged and
//! skipped; the worst a broken script can do is end early.

use log::warn;

use crate::game::Stat;
use crate::opcode::{classify, ControlOp, OpKind, ValOp, Width, NPC_SELF};
use crate::session::{var, Session};

/// What the machine is suspended on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitReason {
    /// A full line of input (ASK, or INPUT into a declared variable).
    Line,
    /// One keypress out of an allow-set (ASKC).
    Char,
    /// A line of digits (INPUTNUM).
    Numeric,
    /// A page pause (WAIT); any acknowledgement resumes.
    Page,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VmState {
    /// Constructed, nothing executed yet.
    Idle,
    /// Decoding statements.
    Running,
    /// Suspended with all working state preserved; `unwait` resumes.
    Waiting(WaitReason),
    /// Terminal. Further steps are no-ops.
    Stopped,
}

/// One collected operand token. `width` is the byte width its data-size
/// marker announced, or 0 for an operator byte.
#[derive(Clone, Copy, Debug)]
struct InVal {
    v: u32,
    width: u8,
}

/// One open block. `run` decides whether statement effects apply;
/// `break_c` is the marker byte that may toggle it (ELSE for an IF frame).
#[derive(Clone, Copy, Debug)]
struct Frame {
    start: usize,
    start_c: u8,
    run: bool,
    break_c: u8,
}

/// An item pulled out of a script's data table.
enum DbItem {
    Num(u32),
    Str(String),
}

/// Declared-variable type tags, shared with the VAR/SVAR operators.
const DECL_NUM: u8 = ValOp::Var as u8;
const DECL_STR: u8 = ValOp::StrVar as u8;

pub struct Interpreter {
    state: VmState,

    /// Operand tokens of the statement being executed.
    vals: Vec<InVal>,
    /// Script offset the statement began at.
    in_start: usize,
    /// Printable text of the statement.
    text: String,
    /// Script offset the text run began at.
    text_start: usize,

    /// String results produced by operators; expressions carry them by
    /// index.
    rstrings: Vec<String>,
    /// Set by SETNAME, substituted for `$Y` in output.
    ystring: String,

    /// A keyword list matched this ask round.
    answer: bool,
    /// One-shot match result for the next ANSWER block.
    latch: bool,

    /// Declared variable id and type tag (0 = none declared).
    decl_v: u8,
    decl_t: u8,

    frames: Vec<Frame>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            state: VmState::Idle,
            vals: Vec::new(),
            in_start: 0,
            text: String::new(),
            text_start: 0,
            rstrings: Vec::new(),
            ystring: String::new(),
            answer: false,
            latch: false,
            decl_v: 0,
            decl_t: 0,
            frames: Vec::new(),
        }
    }

    pub fn state(&self) -> VmState {
        self.state
    }

    /// True while stepping can make progress.
    pub fn running(&self) -> bool {
        matches!(self.state, VmState::Idle | VmState::Running)
    }

    pub fn wait_reason(&self) -> Option<WaitReason> {
        match self.state {
            VmState::Waiting(r) => Some(r),
            _ => None,
        }
    }

    pub fn end(&self) -> bool {
        self.state == VmState::Stopped
    }

    fn wait(&mut self, reason: WaitReason) {
        if self.state != VmState::Stopped {
            self.state = VmState::Waiting(reason);
        }
    }

    /// Resumes a suspended machine at the exact statement it left off.
    pub fn unwait(&mut self) {
        if let VmState::Waiting(_) = self.state {
            self.state = VmState::Running;
        }
    }

    /// Ends the conversation. Idempotent, safe in any state; open blocks
    /// are unwound.
    pub fn stop(&mut self) {
        self.leave_all();
        self.state = VmState::Stopped;
    }

    /// The `$Y` substitution string.
    pub fn ystr(&self) -> &str {
        &self.ystring
    }

    /// True when a declared variable is armed to take the next input.
    pub fn var_input(&self) -> bool {
        self.decl_t != 0
    }

    /// Copies the session's last input into the declared variable.
    pub fn assign_input(&mut self, cx: &mut Session) {
        match self.decl_t {
            DECL_NUM => {
                let n = parse_num(cx.get_input());
                cx.set_var(self.decl_v, n);
            }
            DECL_STR => {
                let s = cx.get_input().to_string();
                cx.set_svar(self.decl_v, &s);
            }
            _ => {}
        }
        self.let_clear();
    }

    /// Collects and executes one statement.
    pub fn step(&mut self, cx: &mut Session) {
        match self.state {
            VmState::Stopped | VmState::Waiting(_) => return,
            VmState::Idle => self.state = VmState::Running,
            VmState::Running => {}
        }
        if cx.script().overflow(0) {
            warn!(
                "talk: script for npc {} ran out at 0x{:x}",
                cx.npc(),
                cx.script().pos()
            );
            self.stop();
            return;
        }
        self.collect(cx);
        self.exec(cx);
    }

    /// Reads one statement's opcode, operand tokens, and text. Stops at
    /// the next statement byte or the end of the script.
    fn collect(&mut self, cx: &mut Session) {
        self.flush();
        self.in_start = cx.script().pos();
        if matches!(
            classify(cx.script().peek(0)),
            OpKind::Control(_) | OpKind::UnknownControl
        ) {
            let b = cx.script_mut().read();
            self.add_val(b, 0);
        }
        loop {
            if cx.script().overflow(0) {
                break;
            }
            match classify(cx.script().peek(0)) {
                OpKind::Control(_) | OpKind::UnknownControl => break,
                OpKind::Print => {
                    if self.text.is_empty() {
                        self.text_start = cx.script().pos();
                    }
                    let c = cx.script_mut().read();
                    self.text.push(c as u8 as char);
                }
                OpKind::DataSize(w) => {
                    cx.script_mut().skip(1);
                    let v = read_width(cx, w);
                    self.add_val(v, w.bytes() as u8);
                }
                OpKind::Value(_) => {
                    let v = cx.script_mut().read();
                    self.add_val(v, 0);
                }
                OpKind::Literal => {
                    let v = cx.script_mut().read();
                    warn!(
                        "talk: unclaimed byte 0x{v:02x} at 0x{:x}",
                        cx.script().pos() - 1
                    );
                }
            }
        }
    }

    /// Executes the collected statement, then drops it.
    fn exec(&mut self, cx: &mut Session) {
        let op = self
            .vals
            .first()
            .filter(|t| t.width == 0)
            .and_then(|t| ControlOp::try_from(t.v as u8).ok());
        match op {
            Some(op) => {
                let text_done = self.do_ctrl(cx, op);
                if !text_done && !self.text.is_empty() {
                    if matches!(self.state, VmState::Waiting(_)) {
                        // text behind a suspension point belongs to the
                        // next tick; hand it back for re-collection
                        cx.script_mut().seek(self.text_start);
                        self.text.clear();
                    } else if self.get_run() {
                        self.emit(cx);
                    }
                }
            }
            None => {
                if let Some(t) = self.vals.first() {
                    warn!(
                        "talk: statement at 0x{:x} opens with 0x{:02x}, skipping it",
                        self.in_start, t.v
                    );
                }
                if self.get_run() {
                    self.emit(cx);
                }
            }
        }
        self.flush();
    }

    /// One statement opcode. Returns true when the statement text was
    /// consumed (keyword lists, descriptions, allow-sets) rather than
    /// being spoken.
    fn do_ctrl(&mut self, cx: &mut Session, op: ControlOp) -> bool {
        let run = self.get_run();
        match op {
            ControlOp::If => {
                let cond = if run {
                    self.eval_args(cx).first().copied().unwrap_or(0)
                } else {
                    // skipped frames never evaluate; queries may have
                    // side effects
                    0
                };
                self.enter(op as u8, run && cond != 0, ControlOp::Else as u8);
            }
            ControlOp::Else => {
                let parent = self.parent_run();
                match self.frames.last_mut() {
                    Some(top) if top.break_c == op as u8 => {
                        top.run = parent && !top.run;
                        top.break_c = 0;
                    }
                    Some(_) => {}
                    None => warn!("talk: else outside any block at 0x{:x}", self.in_start),
                }
            }
            ControlOp::EndIf | ControlOp::EndAnswer => self.leave(),
            ControlOp::Answer => {
                let hit = std::mem::take(&mut self.latch);
                self.enter(op as u8, run && hit, ControlOp::EndAnswer as u8);
            }
            ControlOp::SetFlag | ControlOp::ClearFlag => {
                if run {
                    let args = self.eval_args(cx);
                    let npc = self.npc_of(cx, arg(&args, 0));
                    let flag = arg(&args, 1) as u8;
                    if op == ControlOp::SetFlag {
                        cx.world_mut().set_flag(npc, flag);
                    } else {
                        cx.world_mut().clear_flag(npc, flag);
                    }
                }
            }
            ControlOp::Decl => {
                if run {
                    let id = self.vals.get(1).filter(|t| t.width > 0).map(|t| t.v as u8);
                    let ty = self
                        .vals
                        .iter()
                        .skip(2)
                        .find(|t| t.width == 0 && (t.v as u8 == DECL_NUM || t.v as u8 == DECL_STR))
                        .map(|t| t.v as u8);
                    match (id, ty) {
                        (Some(v), Some(t)) => self.let_(v, t),
                        _ => {
                            warn!("talk: malformed decl at 0x{:x}", self.in_start);
                            self.let_clear();
                        }
                    }
                }
            }
            ControlOp::Assign => {
                if run {
                    let val = self.eval_args(cx).first().copied().unwrap_or(0);
                    match self.decl_t {
                        DECL_NUM => cx.set_var(self.decl_v, val),
                        DECL_STR => {
                            let s = self.rstr(val).to_string();
                            cx.set_svar(self.decl_v, &s);
                        }
                        _ => warn!(
                            "talk: assign with no declared variable at 0x{:x}",
                            self.in_start
                        ),
                    }
                    self.let_clear();
                }
            }
            ControlOp::Jump => {
                if run {
                    let target = self.eval_args(cx).first().copied().unwrap_or(0);
                    self.leave_all();
                    cx.script_mut().seek(target as usize);
                }
                // bytes between the jump and the next statement are
                // unreachable; never speak them
                return true;
            }
            ControlOp::Bye => {
                if run {
                    self.stop();
                }
                // anything after the farewell is data, not dialogue
                return true;
            }
            ControlOp::New | ControlOp::Delete => {
                if run {
                    let args = self.eval_args(cx);
                    let npc = self.npc_of(cx, arg(&args, 0));
                    let (obj, qual, qty) = (arg(&args, 1), arg(&args, 2), arg(&args, 3));
                    if op == ControlOp::New {
                        cx.world_mut().new_obj(npc, obj, qual, qty);
                    } else {
                        cx.world_mut().delete_obj(npc, obj, qual, qty);
                    }
                }
            }
            ControlOp::Give => {
                if run {
                    let args = self.eval_args(cx);
                    let (obj, qual) = (arg(&args, 0), arg(&args, 1));
                    let from = self.npc_of(cx, arg(&args, 2));
                    let to = self.npc_of(cx, arg(&args, 3));
                    cx.world_mut().give_obj(obj, qual, from, to);
                }
            }
            ControlOp::Inventory => {
                // effect unknown in the source data; decode and move on
                warn!("talk: inventory statement ignored at 0x{:x}", self.in_start);
            }
            ControlOp::Portrait => {
                if run {
                    let n = self.eval_args(cx).first().copied().unwrap_or(0);
                    let npc = self.npc_of(cx, n);
                    cx.show_portrait(npc);
                }
            }
            ControlOp::AddKarma | ControlOp::SubKarma => {
                if run {
                    let amount = self.eval_args(cx).first().copied().unwrap_or(0);
                    if op == ControlOp::AddKarma {
                        cx.world_mut().add_karma(amount);
                    } else {
                        cx.world_mut().sub_karma(amount);
                    }
                    let karma = cx.world().karma();
                    cx.set_var(var::KARMA, karma);
                }
            }
            ControlOp::Wait => {
                if run {
                    self.wait(WaitReason::Page);
                }
            }
            ControlOp::WorkType => {
                if run {
                    let args = self.eval_args(cx);
                    let npc = self.npc_of(cx, arg(&args, 0));
                    cx.world_mut().set_worktype(npc, arg(&args, 1));
                }
            }
            ControlOp::SetName => {
                if run {
                    let n = self.eval_args(cx).first().copied().unwrap_or(0);
                    let npc = self.npc_of(cx, n);
                    self.ystring = cx.npc_name(npc);
                }
            }
            ControlOp::Heal | ControlOp::Cure => {
                if run {
                    let n = self.eval_args(cx).first().copied().unwrap_or(0);
                    let npc = self.npc_of(cx, n);
                    if op == ControlOp::Heal {
                        cx.world_mut().heal(npc);
                    } else {
                        cx.world_mut().cure(npc);
                    }
                }
            }
            ControlOp::Keywords => {
                if run && !self.answer {
                    let name = cx.name().to_string();
                    if keywords_match(&self.text, cx.get_input(), Some(&name)) {
                        self.answer = true;
                        self.latch = true;
                    }
                }
                return true;
            }
            ControlOp::Look => {
                let desc = self.text.trim().to_string();
                cx.set_desc(&desc);
                if run {
                    let text = std::mem::take(&mut self.text);
                    cx.print(&format!("You see {text}"));
                }
                return true;
            }
            ControlOp::Converse => {}
            ControlOp::Prefix => {
                warn!("talk: prefix section ignored at 0x{:x}", self.in_start);
                return true;
            }
            ControlOp::Ask => {
                if run {
                    self.answer = false;
                    self.latch = false;
                    cx.set_allowed(None);
                    self.wait(WaitReason::Line);
                }
            }
            ControlOp::AskChar => {
                if run {
                    let allowed = std::mem::take(&mut self.text);
                    cx.set_allowed(Some(&allowed));
                    self.wait(WaitReason::Char);
                }
                return true;
            }
            ControlOp::Input => {
                if run {
                    cx.set_allowed(None);
                    self.wait(WaitReason::Line);
                }
            }
            ControlOp::InputNum => {
                if run {
                    self.wait(WaitReason::Numeric);
                }
            }
            ControlOp::Ident => {
                if run {
                    let id = self.eval_args(cx).first().copied().unwrap_or(0);
                    if id != cx.npc() as u32 {
                        warn!(
                            "talk: script identifies as npc {id} but was loaded for {}",
                            cx.npc()
                        );
                    }
                    let name = self.text.trim().to_string();
                    cx.set_name(&name);
                }
                return true;
            }
        }
        false
    }

    /// Evaluates the operand tokens after the opcode: one postfix pass,
    /// left to right, with a value stack. Each 0xa7 closes an argument.
    fn eval_args(&mut self, cx: &mut Session) -> Vec<u32> {
        let vals = std::mem::take(&mut self.vals);
        let mut args = Vec::new();
        let mut stack: Vec<u32> = Vec::new();
        for t in vals.iter().skip(1) {
            if t.width > 0 {
                stack.push(t.v);
                continue;
            }
            let Ok(op) = ValOp::try_from(t.v as u8) else {
                warn!(
                    "talk: byte 0x{:02x} in an expression at 0x{:x}",
                    t.v, self.in_start
                );
                continue;
            };
            if op == ValOp::Eval {
                args.push(pop_arg(&mut stack, self.in_start));
                stack.clear();
                continue;
            }
            self.evop(cx, op, &mut stack);
        }
        if !stack.is_empty() {
            args.push(pop_arg(&mut stack, self.in_start));
        }
        self.vals = vals;
        args
    }

    /// Applies one expression operator to the value stack.
    fn evop(&mut self, cx: &mut Session, op: ValOp, stack: &mut Vec<u32>) {
        use ValOp::*;
        let at = self.in_start;
        match op {
            Gt | Ge | Lt | Le | Ne | Eq | Add | Sub | Mul | LogicalOr | LogicalAnd => {
                let y = pop_arg(stack, at);
                let x = pop_arg(stack, at);
                let r = match op {
                    Gt => (x > y) as u32,
                    Ge => (x >= y) as u32,
                    Lt => (x < y) as u32,
                    Le => (x <= y) as u32,
                    Ne => (x != y) as u32,
                    Eq => (x == y) as u32,
                    Add => x.wrapping_add(y),
                    Sub => x.wrapping_sub(y),
                    Mul => x.wrapping_mul(y),
                    LogicalOr => (x != 0 || y != 0) as u32,
                    LogicalAnd => (x != 0 && y != 0) as u32,
                    _ => unreachable!(),
                };
                stack.push(r);
            }
            CanCarry => {
                let npc = self.npc_of(cx, pop_arg(stack, at));
                stack.push(cx.world().can_carry(npc));
            }
            Weight => {
                let qty = pop_arg(stack, at);
                let obj = pop_arg(stack, at);
                stack.push(cx.world().obj_weight(obj, qty));
            }
            Rand => {
                let hi = pop_arg(stack, at);
                let lo = pop_arg(stack, at);
                stack.push(cx.world_mut().random(lo, hi));
            }
            Flag => {
                let flag = pop_arg(stack, at) as u8;
                let npc = self.npc_of(cx, pop_arg(stack, at));
                stack.push(cx.world().flag(npc, flag) as u32);
            }
            Var => {
                let id = pop_arg(stack, at) as u8;
                stack.push(cx.get_var(id));
            }
            StrVar => {
                let id = pop_arg(stack, at) as u8;
                let s = cx.get_svar(id).to_string();
                stack.push(self.add_rstring(s));
            }
            Data => {
                let index = pop_arg(stack, at);
                let loc = pop_arg(stack, at);
                match self.get_db(cx, loc, index) {
                    DbItem::Num(v) => stack.push(v),
                    DbItem::Str(s) => {
                        let i = self.add_rstring(s);
                        stack.push(i);
                    }
                }
            }
            ObjCount => {
                let obj = pop_arg(stack, at);
                let npc = self.npc_of(cx, pop_arg(stack, at));
                stack.push(cx.world().inventory_count(npc, obj));
            }
            InParty => {
                let npc = self.npc_of(cx, pop_arg(stack, at));
                stack.push(cx.world().in_party(npc) as u32);
            }
            ObjInParty => {
                let qual = pop_arg(stack, at);
                let obj = pop_arg(stack, at);
                stack.push(cx.world().obj_in_party(obj, qual) as u32);
            }
            NpcNearby => {
                let npc = self.npc_of(cx, pop_arg(stack, at));
                stack.push(cx.world().npc_nearby(npc) as u32);
            }
            Wounded => {
                let npc = self.npc_of(cx, pop_arg(stack, at));
                stack.push(cx.world().wounded(npc) as u32);
            }
            Poisoned => {
                let npc = self.npc_of(cx, pop_arg(stack, at));
                stack.push(cx.world().poisoned(npc) as u32);
            }
            PartyNpc => {
                let pos = pop_arg(stack, at);
                stack.push(cx.world().party_member(pos).unwrap_or(0) as u32);
            }
            Exp | Level | Str | Int | Dex => {
                // stat queries add onto a running value
                let npc = self.npc_of(cx, pop_arg(stack, at));
                let value = pop_arg(stack, at);
                let stat = match op {
                    Exp => Stat::Experience,
                    Level => Stat::Level,
                    Str => Stat::Strength,
                    Int => Stat::Intelligence,
                    _ => Stat::Dexterity,
                };
                stack.push(value.wrapping_add(cx.world().stat(npc, stat)));
            }
            Eval => {}
        }
    }

    /// Reads item `index` from the data table at `loc`: an independent
    /// cursor over the same script bytes. Items are print runs closed by
    /// one delimiter byte, or width-marked numbers.
    fn get_db(&self, cx: &Session, loc: u32, index: u32) -> DbItem {
        let mut s = cx.script().clone();
        s.seek(loc as usize);
        for i in 0..=index {
            if s.overflow(0) {
                warn!("talk: db at 0x{loc:x} has no item {index}");
                return DbItem::Num(0);
            }
            match classify(s.peek(0)) {
                OpKind::Print => {
                    let mut text = String::new();
                    while !s.overflow(0) && matches!(classify(s.peek(0)), OpKind::Print) {
                        text.push(s.read() as u8 as char);
                    }
                    s.skip(1);
                    if i == index {
                        return DbItem::Str(text);
                    }
                }
                OpKind::DataSize(w) => {
                    s.skip(1);
                    let v = match w {
                        Width::One => s.read(),
                        Width::Two => s.read2(),
                        Width::Four => s.read4(),
                    };
                    if i == index {
                        return DbItem::Num(v);
                    }
                }
                _ => {
                    warn!("talk: malformed db item at 0x{:x}", s.pos());
                    return DbItem::Num(0);
                }
            }
        }
        DbItem::Num(0)
    }

    fn npc_of(&self, cx: &Session, n: u32) -> u8 {
        if n == NPC_SELF {
            cx.npc()
        } else {
            n as u8
        }
    }

    fn add_val(&mut self, v: u32, width: u8) {
        self.vals.push(InVal { v, width });
    }

    fn add_rstring(&mut self, s: String) -> u32 {
        self.rstrings.push(s);
        (self.rstrings.len() - 1) as u32
    }

    fn rstr(&self, index: u32) -> &str {
        self.rstrings
            .get(index as usize)
            .map(String::as_str)
            .unwrap_or("")
    }

    fn let_(&mut self, v: u8, t: u8) {
        self.decl_v = v;
        self.decl_t = t;
    }

    fn let_clear(&mut self) {
        self.decl_v = 0;
        self.decl_t = 0;
    }

    /// Speaks the statement text.
    fn emit(&mut self, cx: &mut Session) {
        if !self.text.is_empty() {
            let t = std::mem::take(&mut self.text);
            cx.print(&t);
        }
    }

    fn flush(&mut self) {
        self.vals.clear();
        self.text.clear();
    }

    fn enter(&mut self, start_c: u8, run: bool, break_c: u8) {
        self.frames.push(Frame {
            start: self.in_start,
            start_c,
            run,
            break_c,
        });
    }

    fn leave(&mut self) {
        if self.frames.pop().is_none() {
            warn!(
                "talk: block close with nothing open at 0x{:x}",
                self.in_start
            );
        }
    }

    fn leave_all(&mut self) {
        if let Some(f) = self.frames.last() {
            log::debug!(
                "talk: unwinding {} open block(s), innermost 0x{:02x} from 0x{:x}",
                self.frames.len(),
                f.start_c,
                f.start
            );
        }
        self.frames.clear();
    }

    fn get_run(&self) -> bool {
        self.frames.last().map_or(true, |f| f.run)
    }

    fn parent_run(&self) -> bool {
        match self.frames.len() {
            0 | 1 => true,
            n => self.frames[n - 2].run,
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn read_width(cx: &mut Session, w: Width) -> u32 {
    match w {
        Width::One => cx.script_mut().read(),
        Width::Two => cx.script_mut().read2(),
        Width::Four => cx.script_mut().read4(),
    }
}

fn pop_arg(stack: &mut Vec<u32>, at: usize) -> u32 {
    stack.pop().unwrap_or_else(|| {
        warn!("talk: value stack underflow in statement at 0x{at:x}");
        0
    })
}

fn arg(args: &[u32], i: usize) -> u32 {
    args.get(i).copied().unwrap_or(0)
}

/// Leading digits of the input as a number, 0 when there are none.
fn parse_num(s: &str) -> u32 {
    let digits: String = s
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

/// Matches a `;`-separated keyword list against a line of input.
///
/// A keyword matches when it is a case-insensitive prefix of any word of
/// the input, so "job" matches "What is your job?". `*` matches anything.
/// The keyword "name" also answers to the NPC's own name.
pub fn keywords_match(keywords: &str, input: &str, npc_name: Option<&str>) -> bool {
    let input = input.to_lowercase();
    let words: Vec<&str> = input.split_whitespace().collect();
    for key in keywords.split(';') {
        let key = key.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        if key == "*" {
            return true;
        }
        if words.iter().any(|w| w.starts_with(&key)) {
            return true;
        }
        if key == "name" {
            if let Some(name) = npc_name {
                let name = name.to_lowercase();
                if !name.is_empty() && words.iter().any(|w| w.starts_with(&name)) {
                    return true;
                }
            }
        }
    }
    false
}
