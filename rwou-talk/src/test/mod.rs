//! Test doubles and script-assembly helpers.
//!
//! This is a module rather than test-only code so unit tests, the
//! integration tests, and other workspace crates can all drive a full
//! [`crate::Session`] against a scripted world.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use rwou_lib::{Compression, LibFile};

use crate::game::{GameWorld, PlayerInput, Presenter, Stat};
use crate::opcode::{ControlOp, ValOp};

/// Presenter that records everything it is handed. Clones share state,
/// so a test keeps one handle while the session owns the other.
#[derive(Clone, Default)]
pub struct Recorder {
    inner: Rc<RefCell<RecorderState>>,
}

#[derive(Default)]
struct RecorderState {
    printed: String,
    portraits: Vec<u8>,
}

impl Recorder {
    /// Everything printed so far.
    pub fn output(&self) -> String {
        self.inner.borrow().printed.clone()
    }

    /// Drains and returns the printed text.
    pub fn take_output(&self) -> String {
        std::mem::take(&mut self.inner.borrow_mut().printed)
    }

    pub fn portraits(&self) -> Vec<u8> {
        self.inner.borrow().portraits.clone()
    }
}

impl Presenter for Recorder {
    fn print(&mut self, text: &str) {
        self.inner.borrow_mut().printed.push_str(text);
    }

    fn show_portrait(&mut self, npc: u8) {
        self.inner.borrow_mut().portraits.push(npc);
    }
}

/// Input source fed by the test. Polls pop queued lines in order; an
/// empty queue reads as "nothing yet".
#[derive(Clone, Default)]
pub struct ScriptedInput {
    lines: Rc<RefCell<VecDeque<String>>>,
    requests: Rc<RefCell<usize>>,
}

impl ScriptedInput {
    pub fn feed(&self, line: &str) {
        self.lines.borrow_mut().push_back(line.to_string());
    }

    /// How many times the session asked for input to be gathered.
    pub fn requests(&self) -> usize {
        *self.requests.borrow()
    }
}

impl PlayerInput for ScriptedInput {
    fn request(&mut self, _allowed: Option<&str>) {
        *self.requests.borrow_mut() += 1;
    }

    fn poll(&mut self, _allowed: Option<&str>, _nonblock: bool) -> Option<String> {
        self.lines.borrow_mut().pop_front()
    }
}

/// Game-state double backed by plain fields.
#[derive(Default)]
pub struct WorldState {
    pub names: HashMap<u8, String>,
    pub sex: u32,
    pub karma: u32,
    pub hp: u32,
    pub quest: u32,
    pub party: Vec<u8>,
    pub dead: Vec<u8>,
    pub flags: HashSet<(u8, u8)>,
    pub worktypes: HashMap<u8, u32>,
    pub wounded: HashSet<u8>,
    pub poisoned: HashSet<u8>,
    pub nearby: HashSet<u8>,
    pub stats: HashMap<(u8, Stat), u32>,
    pub inventory: HashMap<(u8, u32), u32>,
    pub carry: HashMap<u8, u32>,
    pub weights: HashMap<u32, u32>,
    /// Queued results for the random operator; an empty queue returns
    /// the low bound, keeping scripts deterministic.
    pub rolls: VecDeque<u32>,
    pub healed: Vec<u8>,
    pub cured: Vec<u8>,
    pub joined: Vec<u8>,
    pub created: Vec<(u8, u32, u32, u32)>,
    pub deleted: Vec<(u8, u32, u32, u32)>,
    pub given: Vec<(u32, u32, u8, u8)>,
}

#[derive(Clone, Default)]
pub struct TestWorld {
    pub state: Rc<RefCell<WorldState>>,
}

impl GameWorld for TestWorld {
    fn npc_name(&self, npc: u8) -> Option<String> {
        self.state.borrow().names.get(&npc).cloned()
    }

    fn actor_exists(&self, npc: u8) -> bool {
        self.state.borrow().names.contains_key(&npc)
    }

    fn player_sex(&self) -> u32 {
        self.state.borrow().sex
    }

    fn karma(&self) -> u32 {
        self.state.borrow().karma
    }

    fn add_karma(&mut self, amount: u32) {
        let mut w = self.state.borrow_mut();
        w.karma = w.karma.saturating_add(amount);
    }

    fn sub_karma(&mut self, amount: u32) {
        let mut w = self.state.borrow_mut();
        w.karma = w.karma.saturating_sub(amount);
    }

    fn quest_flag(&self) -> u32 {
        self.state.borrow().quest
    }

    fn set_quest_flag(&mut self, value: u32) {
        self.state.borrow_mut().quest = value;
    }

    fn player_hp(&self) -> u32 {
        self.state.borrow().hp
    }

    fn stat(&self, npc: u8, stat: Stat) -> u32 {
        self.state.borrow().stats.get(&(npc, stat)).copied().unwrap_or(0)
    }

    fn flag(&self, npc: u8, flag: u8) -> bool {
        self.state.borrow().flags.contains(&(npc, flag))
    }

    fn set_flag(&mut self, npc: u8, flag: u8) {
        self.state.borrow_mut().flags.insert((npc, flag));
    }

    fn clear_flag(&mut self, npc: u8, flag: u8) {
        self.state.borrow_mut().flags.remove(&(npc, flag));
    }

    fn worktype(&self, npc: u8) -> u32 {
        self.state.borrow().worktypes.get(&npc).copied().unwrap_or(0)
    }

    fn set_worktype(&mut self, npc: u8, worktype: u32) {
        self.state.borrow_mut().worktypes.insert(npc, worktype);
    }

    fn wounded(&self, npc: u8) -> bool {
        self.state.borrow().wounded.contains(&npc)
    }

    fn poisoned(&self, npc: u8) -> bool {
        self.state.borrow().poisoned.contains(&npc)
    }

    fn heal(&mut self, npc: u8) {
        let mut w = self.state.borrow_mut();
        w.wounded.remove(&npc);
        w.healed.push(npc);
    }

    fn cure(&mut self, npc: u8) {
        let mut w = self.state.borrow_mut();
        w.poisoned.remove(&npc);
        w.cured.push(npc);
    }

    fn npc_nearby(&self, npc: u8) -> bool {
        self.state.borrow().nearby.contains(&npc)
    }

    fn party_size(&self, living_only: bool) -> u32 {
        let w = self.state.borrow();
        if living_only {
            w.party.iter().filter(|n| !w.dead.contains(n)).count() as u32
        } else {
            w.party.len() as u32
        }
    }

    fn in_party(&self, npc: u8) -> bool {
        self.state.borrow().party.contains(&npc)
    }

    fn party_member(&self, position: u32) -> Option<u8> {
        self.state.borrow().party.get(position as usize).copied()
    }

    fn join_party(&mut self, npc: u8) {
        let mut w = self.state.borrow_mut();
        if !w.party.contains(&npc) {
            w.party.push(npc);
        }
        w.joined.push(npc);
    }

    fn inventory_count(&self, npc: u8, obj: u32) -> u32 {
        self.state.borrow().inventory.get(&(npc, obj)).copied().unwrap_or(0)
    }

    fn obj_in_party(&self, obj: u32, _quality: u32) -> bool {
        let w = self.state.borrow();
        w.party
            .iter()
            .any(|&npc| w.inventory.get(&(npc, obj)).copied().unwrap_or(0) > 0)
    }

    fn new_obj(&mut self, npc: u8, obj: u32, quality: u32, quantity: u32) {
        let mut w = self.state.borrow_mut();
        *w.inventory.entry((npc, obj)).or_insert(0) += quantity;
        w.created.push((npc, obj, quality, quantity));
    }

    fn delete_obj(&mut self, npc: u8, obj: u32, quality: u32, quantity: u32) {
        let mut w = self.state.borrow_mut();
        if let Some(count) = w.inventory.get_mut(&(npc, obj)) {
            *count = count.saturating_sub(quantity);
        }
        w.deleted.push((npc, obj, quality, quantity));
    }

    fn give_obj(&mut self, obj: u32, quality: u32, from: u8, to: u8) {
        self.state.borrow_mut().given.push((obj, quality, from, to));
    }

    fn can_carry(&self, npc: u8) -> u32 {
        self.state.borrow().carry.get(&npc).copied().unwrap_or(0)
    }

    fn obj_weight(&self, obj: u32, quantity: u32) -> u32 {
        self.state.borrow().weights.get(&obj).copied().unwrap_or(0) * quantity
    }

    fn random(&mut self, lo: u32, _hi: u32) -> u32 {
        self.state.borrow_mut().rolls.pop_front().unwrap_or(lo)
    }
}

/// Hand-assembles a talk script, one token at a time.
#[derive(Default)]
pub struct ScriptBuilder {
    bytes: Vec<u8>,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current length; statement offsets for jumps and data tables.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn raw(mut self, b: u8) -> Self {
        self.bytes.push(b);
        self
    }

    pub fn text(mut self, s: &str) -> Self {
        self.bytes.extend_from_slice(s.as_bytes());
        self
    }

    pub fn op(mut self, op: ControlOp) -> Self {
        self.bytes.push(op as u8);
        self
    }

    pub fn valop(mut self, op: ValOp) -> Self {
        self.bytes.push(op as u8);
        self
    }

    /// A one-byte literal behind its width marker.
    pub fn u8_(mut self, v: u8) -> Self {
        self.bytes.extend_from_slice(&[0xd3, v]);
        self
    }

    pub fn u16_(mut self, v: u16) -> Self {
        self.bytes.push(0xd4);
        self.bytes.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u32_(mut self, v: u32) -> Self {
        self.bytes.push(0xd2);
        self.bytes.extend_from_slice(&v.to_le_bytes());
        self
    }

    /// Closes one expression argument.
    pub fn eval(self) -> Self {
        self.valop(ValOp::Eval)
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// Builds an in-memory uncompressed library archive holding the given
/// scripts at the given item indices; gaps become empty slots.
pub fn archive(items: &[(usize, &[u8])]) -> LibFile {
    let mut items: Vec<(usize, &[u8])> = items.to_vec();
    items.sort_by_key(|&(i, _)| i);
    let count = items.iter().map(|(i, _)| i + 1).max().unwrap_or(1);
    let table = (count * 4) as u32;
    let mut offsets = vec![0u32; count];
    let mut body: Vec<u8> = Vec::new();
    for &(index, bytes) in &items {
        offsets[index] = table + body.len() as u32;
        body.extend_from_slice(bytes);
    }
    let mut out = Vec::with_capacity(table as usize + body.len());
    for off in offsets {
        out.extend_from_slice(&off.to_le_bytes());
    }
    out.extend_from_slice(&body);
    LibFile::from_bytes(out, Compression::None).expect("test archive is well formed")
}
