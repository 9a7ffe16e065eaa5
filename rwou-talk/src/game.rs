//! Capability interfaces binding a conversation to the rest of the game.
//!
//! A [`crate::session::Session`] owns one implementation of each trait.
//! The defaults answer every query with a neutral value, so hosts and
//! test doubles only implement what their scripts actually touch.

use serde::{Deserialize, Serialize};

/// Which game's talk dialect the session speaks. The sibling games reuse
/// the same opcode tables; behavioral splits hang off this value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameKind {
    Ultima6,
    MartianDreams,
    SavageEmpire,
}

/// Actor statistic selector for the stat query operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stat {
    Experience,
    Level,
    Strength,
    Intelligence,
    Dexterity,
}

/// Coarse clock reading backing the `$T` greeting token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    pub fn greeting(self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
        }
    }
}

/// Sink for conversation output.
pub trait Presenter {
    /// Shows a chunk of spoken text. Substitution has already happened.
    fn print(&mut self, text: &str);

    /// Shows an actor's portrait.
    fn show_portrait(&mut self, npc: u8);
}

/// Source of player input, polled while the conversation waits.
pub trait PlayerInput {
    /// Called once when the script starts waiting. `allowed` restricts
    /// single-character prompts to the given set.
    fn request(&mut self, allowed: Option<&str>) {
        let _ = allowed;
    }

    /// The pending line or keypress, or None when nothing is ready yet.
    fn poll(&mut self, allowed: Option<&str>, nonblock: bool) -> Option<String>;
}

/// Everything a script can ask of, or do to, the world outside the
/// conversation.
pub trait GameWorld {
    fn npc_name(&self, npc: u8) -> Option<String> {
        let _ = npc;
        None
    }

    fn actor_exists(&self, npc: u8) -> bool {
        let _ = npc;
        false
    }

    fn player_name(&self) -> String {
        "Avatar".to_string()
    }

    /// 0 male, 1 female, matching the variable the scripts read.
    fn player_sex(&self) -> u32 {
        0
    }

    fn time_of_day(&self) -> TimeOfDay {
        TimeOfDay::Morning
    }

    fn karma(&self) -> u32 {
        0
    }

    fn add_karma(&mut self, amount: u32) {
        let _ = amount;
    }

    fn sub_karma(&mut self, amount: u32) {
        let _ = amount;
    }

    fn quest_flag(&self) -> u32 {
        0
    }

    fn set_quest_flag(&mut self, value: u32) {
        let _ = value;
    }

    fn player_hp(&self) -> u32 {
        0
    }

    fn stat(&self, npc: u8, stat: Stat) -> u32 {
        let _ = (npc, stat);
        0
    }

    fn flag(&self, npc: u8, flag: u8) -> bool {
        let _ = (npc, flag);
        false
    }

    fn set_flag(&mut self, npc: u8, flag: u8) {
        let _ = (npc, flag);
    }

    fn clear_flag(&mut self, npc: u8, flag: u8) {
        let _ = (npc, flag);
    }

    fn worktype(&self, npc: u8) -> u32 {
        let _ = npc;
        0
    }

    fn set_worktype(&mut self, npc: u8, worktype: u32) {
        let _ = (npc, worktype);
    }

    fn wounded(&self, npc: u8) -> bool {
        let _ = npc;
        false
    }

    fn poisoned(&self, npc: u8) -> bool {
        let _ = npc;
        false
    }

    fn heal(&mut self, npc: u8) {
        let _ = npc;
    }

    fn cure(&mut self, npc: u8) {
        let _ = npc;
    }

    fn npc_nearby(&self, npc: u8) -> bool {
        let _ = npc;
        false
    }

    /// Living members only when `living_only` is set.
    fn party_size(&self, living_only: bool) -> u32 {
        let _ = living_only;
        0
    }

    fn in_party(&self, npc: u8) -> bool {
        let _ = npc;
        false
    }

    /// Actor id sitting at a party position, leader first.
    fn party_member(&self, position: u32) -> Option<u8> {
        let _ = position;
        None
    }

    fn join_party(&mut self, npc: u8) {
        let _ = npc;
    }

    fn inventory_count(&self, npc: u8, obj: u32) -> u32 {
        let _ = (npc, obj);
        0
    }

    fn obj_in_party(&self, obj: u32, quality: u32) -> bool {
        let _ = (obj, quality);
        false
    }

    fn new_obj(&mut self, npc: u8, obj: u32, quality: u32, quantity: u32) {
        let _ = (npc, obj, quality, quantity);
    }

    fn delete_obj(&mut self, npc: u8, obj: u32, quality: u32, quantity: u32) {
        let _ = (npc, obj, quality, quantity);
    }

    fn give_obj(&mut self, obj: u32, quality: u32, from: u8, to: u8) {
        let _ = (obj, quality, from, to);
    }

    /// Weight an actor can still pick up.
    fn can_carry(&self, npc: u8) -> u32 {
        let _ = npc;
        0
    }

    fn obj_weight(&self, obj: u32, quantity: u32) -> u32 {
        let _ = (obj, quantity);
        0
    }

    /// Uniform draw from an inclusive range.
    fn random(&mut self, lo: u32, hi: u32) -> u32 {
        let _ = hi;
        lo
    }
}
