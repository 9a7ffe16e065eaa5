//! The conversation session.
//!
//! A [`Session`] owns everything around the interpreter: the bound game
//! collaborators, the open script containers, the variable table, and the
//! input/output buffers. The surrounding game loop calls [`Session::start`]
//! once and [`Session::continue_script`] every tick; the session feeds
//! player input to the interpreter, drives steps, and flushes spoken text
//! through the presenter with the `$`-tokens substituted.

use anyhow::{bail, Context, Result};
use log::{debug, info, warn};

use rwou_lib::LibFile;

use crate::buffer::ScriptBuffer;
use crate::config::TalkConfig;
use crate::game::{GameKind, GameWorld, PlayerInput, Presenter};
use crate::interpreter::{Interpreter, WaitReason};

/// Well-known variable ids. Slots above [`var::LAST`] do not exist:
/// reads yield zero, writes are dropped.
pub mod var {
    /// Avatar's sex: 0 male, 1 female.
    pub const SEX: u8 = 0x10;
    /// Avatar's karma.
    pub const KARMA: u8 = 0x14;
    /// Living party members.
    pub const PARTYLIVE: u8 = 0x17;
    /// All party members.
    pub const PARTYALL: u8 = 0x18;
    /// Avatar's hit points.
    pub const HP: u8 = 0x19;
    /// Zero means "thou art not upon a sacred quest".
    pub const QUESTF: u8 = 0x1a;
    /// The talked-to actor's scheduled activity.
    pub const WORKTYPE: u8 = 0x20;
    /// Previous player input, the `$Z` string.
    pub const INPUT: u8 = 0x23;
    /// Highest id a script may touch.
    pub const LAST: u8 = 0x25;
}

/// One variable slot. The script decides per access whether a slot is
/// numeric or a string.
#[derive(Clone, Debug, Default)]
struct VarSlot {
    num: u32,
    s: Option<String>,
}

/// Statements one tick may execute before the session assumes a script
/// that never waits and cuts it off.
const MAX_STATEMENTS_PER_TICK: usize = 65_536;

struct NullPresenter;

impl Presenter for NullPresenter {
    fn print(&mut self, _text: &str) {}
    fn show_portrait(&mut self, _npc: u8) {}
}

struct NullInput;

impl PlayerInput for NullInput {
    fn poll(&mut self, _allowed: Option<&str>, _nonblock: bool) -> Option<String> {
        None
    }
}

struct NullWorld;

impl GameWorld for NullWorld {}

pub struct Session {
    config: TalkConfig,

    presenter: Box<dyn Presenter>,
    input: Box<dyn PlayerInput>,
    world: Box<dyn GameWorld>,
    initialized: bool,

    /// Script containers, searched in bind order.
    sources: Vec<LibFile>,

    interpreter: Option<Interpreter>,
    script: ScriptBuffer,

    npc: u8,
    name: String,
    desc: String,
    active: bool,

    in_str: String,
    out_str: String,
    /// Allow-set for single-character input, owned by the ASKC statement.
    allowed: Option<String>,

    variables: Vec<VarSlot>,
}

impl Session {
    pub fn new(config: TalkConfig) -> Self {
        Self {
            config,
            presenter: Box::new(NullPresenter),
            input: Box::new(NullInput),
            world: Box::new(NullWorld),
            initialized: false,
            sources: Vec::new(),
            interpreter: None,
            script: ScriptBuffer::default(),
            npc: 0,
            name: String::new(),
            desc: String::new(),
            active: false,
            in_str: String::new(),
            out_str: String::new(),
            allowed: None,
            variables: vec![VarSlot::default(); var::LAST as usize + 1],
        }
    }

    /// Binds the game collaborators. Must be called exactly once before
    /// any conversation starts; a second call is an error.
    pub fn init(
        &mut self,
        presenter: Box<dyn Presenter>,
        input: Box<dyn PlayerInput>,
        world: Box<dyn GameWorld>,
    ) -> Result<()> {
        if self.initialized {
            bail!("talk session is already initialized");
        }
        self.presenter = presenter;
        self.input = input;
        self.world = world;
        self.initialized = true;
        Ok(())
    }

    /// Opens a script container file and adds it to the search list.
    /// Ultima 6 splits its scripts across converse.a and converse.b, so a
    /// session usually binds two.
    pub fn load_conv(&mut self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let path = path.as_ref();
        let lib = LibFile::open(path)
            .with_context(|| format!("opening script container {}", path.display()))?;
        debug!(
            "talk: bound {} with {} items ({:?})",
            path.display(),
            lib.item_count(),
            lib.compression()
        );
        self.sources.push(lib);
        Ok(())
    }

    /// Adds an already-opened container to the search list.
    pub fn bind_source(&mut self, lib: LibFile) {
        self.sources.push(lib);
    }

    /// Drops all bound containers.
    pub fn unload_conv(&mut self) {
        self.sources.clear();
    }

    /// Finds and loads the script for an actor across the bound sources,
    /// decompressing when the container calls for it.
    pub fn load_script(&self, npc: u8) -> Option<ScriptBuffer> {
        for (src_num, src) in self.sources.iter().enumerate() {
            if src.is_empty_item(npc as usize) {
                continue;
            }
            match src.load(npc as usize) {
                Ok(bytes) => {
                    let compressed = src.compression() == rwou_lib::Compression::Lzw;
                    return Some(ScriptBuffer::from_item(bytes, src_num as u32, compressed));
                }
                Err(e) => {
                    warn!("talk: script {npc} in source {src_num}: {e}");
                    return None;
                }
            }
        }
        None
    }

    /// The interpreter for this session's dialect. The sibling games
    /// currently share one opcode set; this is the seam where they would
    /// part.
    pub fn new_interpreter(&self) -> Interpreter {
        match self.config.game {
            GameKind::Ultima6 | GameKind::MartianDreams | GameKind::SavageEmpire => {
                Interpreter::new()
            }
        }
    }

    /// Begins a conversation with an actor. Any active conversation is
    /// torn down first. False when the actor has no script to speak.
    pub fn start(&mut self, npc: u8) -> bool {
        if !self.initialized {
            warn!("talk: start({npc}) before init");
            return false;
        }
        if self.active {
            self.stop();
        }
        let Some(script) = self.load_script(npc) else {
            info!("talk: npc {npc} has nothing to say");
            return false;
        };
        self.script = script;
        self.npc = npc;
        self.name = self.world.npc_name(npc).unwrap_or_default();
        self.desc.clear();
        self.in_str.clear();
        self.out_str.clear();
        self.allowed = None;
        self.init_variables();
        self.interpreter = Some(self.new_interpreter());
        self.active = true;
        if self.config.party_all_the_time {
            self.world.join_party(npc);
        }
        true
    }

    /// One tick of conversation: feed pending input if the interpreter is
    /// waiting for it, run statements until it waits or stops, flush the
    /// spoken text. On stop the script and interpreter are released.
    pub fn continue_script(&mut self) {
        if !self.active {
            return;
        }
        let Some(mut interp) = self.interpreter.take() else {
            self.active = false;
            return;
        };
        if let Some(reason) = interp.wait_reason() {
            let allowed = match reason {
                WaitReason::Char => self.allowed.clone(),
                WaitReason::Numeric => Some("0123456789".to_string()),
                WaitReason::Line | WaitReason::Page => None,
            };
            match self.poll_input(allowed.as_deref(), true) {
                None => {
                    self.interpreter = Some(interp);
                    return;
                }
                Some(line) => {
                    if reason == WaitReason::Page {
                        // any acknowledgement turns the page
                        interp.unwait();
                    } else {
                        self.in_str = line;
                        if !interp.var_input() && self.override_input() {
                            // handled outside the script; keep waiting
                            let y = interp.ystr().to_string();
                            self.flush_output(&y);
                            self.interpreter = Some(interp);
                            return;
                        }
                        let line = self.in_str.clone();
                        self.set_svar(var::INPUT, &line);
                        if interp.var_input() {
                            interp.assign_input(self);
                        }
                        interp.unwait();
                    }
                }
            }
        }
        let mut steps = 0;
        while interp.running() {
            interp.step(self);
            steps += 1;
            if steps >= MAX_STATEMENTS_PER_TICK {
                warn!(
                    "talk: script for npc {} did not yield after {steps} statements, cutting it off",
                    self.npc
                );
                interp.stop();
            }
        }
        let y = interp.ystr().to_string();
        self.flush_output(&y);
        if interp.end() {
            self.release();
        } else {
            if interp.wait_reason().is_some() {
                self.input.request(self.allowed.as_deref());
            }
            self.interpreter = Some(interp);
        }
    }

    /// Ends any active conversation immediately. Safe to call at any
    /// time, in any state.
    pub fn stop(&mut self) {
        if let Some(mut interp) = self.interpreter.take() {
            interp.stop();
        }
        self.release();
    }

    fn release(&mut self) {
        self.interpreter = None;
        self.script = ScriptBuffer::default();
        self.active = false;
        self.allowed = None;
    }

    pub fn running(&self) -> bool {
        self.active
    }

    /// Lifts a waiting interpreter back to running without feeding input.
    pub fn unwait(&mut self) {
        if let Some(interp) = self.interpreter.as_mut() {
            interp.unwait();
        }
    }

    /// Asks the input collaborator for a line or keypress. Non-blocking
    /// polls return None when nothing is ready yet.
    pub fn poll_input(&mut self, allowed: Option<&str>, nonblock: bool) -> Option<String> {
        self.input.poll(allowed, nonblock)
    }

    /// Input rules that act before the script sees the line: silence
    /// means "bye", and "look" replays the description instead of being
    /// interpreted. True when the line was consumed here.
    fn override_input(&mut self) -> bool {
        if self.in_str.trim().is_empty() {
            self.in_str = "bye".to_string();
            return false;
        }
        if self.in_str.trim().eq_ignore_ascii_case("look") {
            let desc = self.desc.clone();
            self.print(&format!("You see {desc}\n"));
            return true;
        }
        false
    }

    pub fn get_input(&self) -> &str {
        &self.in_str
    }

    pub fn set_input(&mut self, s: &str) {
        self.in_str = s.to_string();
    }

    pub fn get_output(&self) -> &str {
        &self.out_str
    }

    pub fn set_output(&mut self, s: &str) {
        self.out_str = s.to_string();
    }

    /// Appends spoken text. Token substitution happens at flush time.
    pub fn print(&mut self, s: &str) {
        self.out_str.push_str(s);
    }

    fn flush_output(&mut self, ystr: &str) {
        if self.out_str.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.out_str);
        let text = self.substitute(&text, ystr);
        self.presenter.print(&text);
    }

    /// Replaces the `$` tokens: $G gender title, $N this NPC's name,
    /// $P player name, $T time-of-day greeting, $Y the SETNAME string,
    /// $Z the previous input.
    fn substitute(&self, text: &str, ystr: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut chars = text.chars();
        while let Some(c) = chars.next() {
            if c != '$' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('G') => out.push_str(if self.world.player_sex() == 0 {
                    "milord"
                } else {
                    "milady"
                }),
                Some('N') => out.push_str(&self.name),
                Some('P') => out.push_str(&self.world.player_name()),
                Some('T') => out.push_str(self.world.time_of_day().greeting()),
                Some('Y') => out.push_str(ystr),
                Some('Z') => out.push_str(self.get_svar(var::INPUT)),
                Some(other) => {
                    out.push('$');
                    out.push(other);
                }
                None => out.push('$'),
            }
        }
        out
    }

    /// Display name for an actor, independent of any loaded script. The
    /// conversation target answers with the name its script declared.
    pub fn npc_name(&self, npc: u8) -> String {
        if npc == self.npc && !self.name.is_empty() {
            return self.name.clone();
        }
        self.world.npc_name(npc).unwrap_or_default()
    }

    pub fn show_portrait(&mut self, npc: u8) {
        self.presenter.show_portrait(npc);
    }

    pub fn get_var(&self, id: u8) -> u32 {
        self.variables.get(id as usize).map_or(0, |v| v.num)
    }

    pub fn set_var(&mut self, id: u8, val: u32) {
        if let Some(slot) = self.variables.get_mut(id as usize) {
            slot.num = val;
        }
    }

    pub fn get_svar(&self, id: u8) -> &str {
        self.variables
            .get(id as usize)
            .and_then(|v| v.s.as_deref())
            .unwrap_or("")
    }

    pub fn set_svar(&mut self, id: u8, s: &str) {
        if let Some(slot) = self.variables.get_mut(id as usize) {
            slot.s = Some(s.to_string());
        }
    }

    /// Resets the table and imports the avatar- and actor-side values
    /// scripts read without asking.
    pub fn init_variables(&mut self) {
        for slot in &mut self.variables {
            slot.num = 0;
            slot.s = None;
        }
        let sex = self.world.player_sex();
        self.set_var(var::SEX, sex);
        let karma = self.world.karma();
        self.set_var(var::KARMA, karma);
        let live = self.world.party_size(true);
        self.set_var(var::PARTYLIVE, live);
        let all = self.world.party_size(false);
        self.set_var(var::PARTYALL, all);
        let hp = self.world.player_hp();
        self.set_var(var::HP, hp);
        let quest = self.world.quest_flag();
        self.set_var(var::QUESTF, quest);
        let wt = self.world.worktype(self.npc);
        self.set_var(var::WORKTYPE, wt);
    }

    pub(crate) fn script(&self) -> &ScriptBuffer {
        &self.script
    }

    pub(crate) fn script_mut(&mut self) -> &mut ScriptBuffer {
        &mut self.script
    }

    pub(crate) fn npc(&self) -> u8 {
        self.npc
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub(crate) fn set_desc(&mut self, desc: &str) {
        self.desc = desc.to_string();
    }

    pub(crate) fn set_allowed(&mut self, allowed: Option<&str>) {
        self.allowed = allowed.map(str::to_string);
    }

    pub(crate) fn world(&self) -> &dyn GameWorld {
        self.world.as_ref()
    }

    pub(crate) fn world_mut(&mut self) -> &mut dyn GameWorld {
        self.world.as_mut()
    }
}
