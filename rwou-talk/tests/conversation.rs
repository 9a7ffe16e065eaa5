//! Full conversations driven through a Session against scripted doubles.

use pretty_assertions::assert_eq;

use rwou_talk::test::{archive, Recorder, ScriptBuilder, ScriptedInput, TestWorld};
use rwou_talk::{ControlOp, Session, TalkConfig, TalkConfigBuilder, ValOp};

struct Harness {
    cx: Session,
    out: Recorder,
    input: ScriptedInput,
    world: TestWorld,
}

fn harness_with(config: TalkConfig, npc: usize, script: &[u8]) -> Harness {
    let out = Recorder::default();
    let input = ScriptedInput::default();
    let world = TestWorld::default();
    let mut cx = Session::new(config);
    cx.init(
        Box::new(out.clone()),
        Box::new(input.clone()),
        Box::new(world.clone()),
    )
    .expect("first init");
    cx.bind_source(archive(&[(npc, script)]));
    Harness {
        cx,
        out,
        input,
        world,
    }
}

fn harness(npc: usize, script: &[u8]) -> Harness {
    harness_with(TalkConfig::default(), npc, script)
}

/// The classic ask round: ident/look preamble, keyword answers, a loop
/// back to the prompt, and the silent-input "bye" rule.
#[test]
fn keyword_rounds_until_bye() {
    let mut b = ScriptBuilder::new()
        .op(ControlOp::Ident)
        .u8_(1)
        .eval()
        .text("Iolo\n")
        .op(ControlOp::Look)
        .text("a bard.\n")
        .op(ControlOp::Converse)
        .text("Hail, $P.\n");
    let label = b.len() as u32;
    let script = b
        .op(ControlOp::Ask)
        .op(ControlOp::Keywords)
        .text("job;work")
        .op(ControlOp::Answer)
        .text("I sing.\n")
        .op(ControlOp::EndAnswer)
        .op(ControlOp::Keywords)
        .text("bye")
        .op(ControlOp::Answer)
        .text("Goodbye.\n")
        .op(ControlOp::Bye)
        .op(ControlOp::EndAnswer)
        .op(ControlOp::Keywords)
        .text("*")
        .op(ControlOp::Answer)
        .text("Thou saidst $Z?\n")
        .op(ControlOp::EndAnswer)
        .op(ControlOp::Jump)
        .u32_(label)
        .eval()
        .build();

    let mut h = harness(1, &script);
    h.world.state.borrow_mut().names.insert(1, "Iolo".into());
    assert!(h.cx.start(1));
    h.cx.continue_script();
    assert_eq!(h.out.take_output(), "You see a bard.\nHail, Avatar.\n");
    assert!(h.cx.running());

    // nothing fed yet: the session keeps waiting without re-running
    h.cx.continue_script();
    assert_eq!(h.out.take_output(), "");

    h.input.feed("What is thy job?");
    h.cx.continue_script();
    assert_eq!(h.out.take_output(), "I sing.\n");
    assert!(h.cx.running());

    h.input.feed("dance");
    h.cx.continue_script();
    assert_eq!(h.out.take_output(), "Thou saidst dance?\n");

    // silence reads as "bye"
    h.input.feed("");
    h.cx.continue_script();
    assert_eq!(h.out.take_output(), "Goodbye.\n");
    assert!(!h.cx.running());
}

/// "look" is answered by the session itself; the script never resumes.
#[test]
fn look_replays_the_description() {
    let script = ScriptBuilder::new()
        .op(ControlOp::Look)
        .text("a grizzled miner.\n")
        .op(ControlOp::Ask)
        .op(ControlOp::Keywords)
        .text("*")
        .op(ControlOp::Answer)
        .text("Eh?\n")
        .op(ControlOp::EndAnswer)
        .op(ControlOp::Bye)
        .build();
    let mut h = harness(3, &script);
    assert!(h.cx.start(3));
    h.cx.continue_script();
    h.out.take_output();

    h.input.feed("look");
    h.cx.continue_script();
    assert_eq!(h.out.take_output(), "You see a grizzled miner.\n");
    assert!(h.cx.running(), "look must not consume the script's wait");
}

/// INPUTNUM parks the machine, then the fed digits land in the declared
/// variable before decoding resumes at the same spot.
#[test]
fn numeric_input_into_a_declared_variable() {
    let script = ScriptBuilder::new()
        .text("How many?\n")
        .op(ControlOp::Decl)
        .u8_(5)
        .valop(ValOp::Var)
        .op(ControlOp::InputNum)
        .op(ControlOp::If)
        .u8_(5)
        .valop(ValOp::Var)
        .u8_(42)
        .valop(ValOp::Eq)
        .eval()
        .text("Right.\n")
        .op(ControlOp::Else)
        .text("Wrong.\n")
        .op(ControlOp::EndIf)
        .op(ControlOp::Bye)
        .build();

    let mut h = harness(2, &script);
    assert!(h.cx.start(2));
    h.cx.continue_script();
    assert_eq!(h.out.take_output(), "How many?\n");
    assert!(h.cx.running());

    h.input.feed("42");
    h.cx.continue_script();
    assert_eq!(h.out.take_output(), "Right.\n");
    assert!(!h.cx.running());
    assert_eq!(h.cx.get_var(5), 42);
}

/// A single keypress restricted to the statement's allow-set.
#[test]
fn single_character_prompt() {
    let script = ScriptBuilder::new()
        .text("Wilt thou? ")
        .op(ControlOp::AskChar)
        .text("yn")
        .op(ControlOp::Keywords)
        .text("y")
        .op(ControlOp::Answer)
        .text("Yea!\n")
        .op(ControlOp::EndAnswer)
        .op(ControlOp::Keywords)
        .text("*")
        .op(ControlOp::Answer)
        .text("Nay.\n")
        .op(ControlOp::EndAnswer)
        .op(ControlOp::Bye)
        .build();
    let mut h = harness(2, &script);
    assert!(h.cx.start(2));
    h.cx.continue_script();
    assert_eq!(h.out.take_output(), "Wilt thou? ");
    assert_eq!(h.input.requests(), 1);

    h.input.feed("y");
    h.cx.continue_script();
    assert_eq!(h.out.take_output(), "Yea!\n");
    assert!(!h.cx.running());
}

/// Nothing inside a skipped outer block runs, not even a true inner
/// branch; bookkeeping still finds both ends.
#[test]
fn nested_blocks_under_a_false_outer() {
    let script = ScriptBuilder::new()
        .op(ControlOp::If)
        .u8_(0)
        .eval()
        .text("A")
        .op(ControlOp::If)
        .u8_(1)
        .eval()
        .text("B")
        .op(ControlOp::EndIf)
        .text("C")
        .op(ControlOp::EndIf)
        .text("Done")
        .op(ControlOp::Bye)
        .build();
    let mut h = harness(1, &script);
    assert!(h.cx.start(1));
    h.cx.continue_script();
    assert_eq!(h.out.output(), "Done");
    assert!(!h.cx.running());
}

/// Side effects honor the run flag: the first karma bump is inside a
/// dead branch, the second applies and refreshes the KARMA variable.
#[test]
fn state_mutation_respects_skipping() {
    let script = ScriptBuilder::new()
        .op(ControlOp::If)
        .u8_(0)
        .eval()
        .op(ControlOp::AddKarma)
        .u8_(5)
        .eval()
        .op(ControlOp::EndIf)
        .op(ControlOp::If)
        .u8_(1)
        .eval()
        .op(ControlOp::AddKarma)
        .u8_(5)
        .eval()
        .op(ControlOp::EndIf)
        .op(ControlOp::Bye)
        .build();
    let mut h = harness(1, &script);
    h.world.state.borrow_mut().karma = 10;
    assert!(h.cx.start(1));
    h.cx.continue_script();
    assert_eq!(h.world.state.borrow().karma, 15);
    assert_eq!(h.cx.get_var(rwou_talk::var::KARMA), 15);
}

/// SETNAME binds $Y, PORTRAIT reaches the presenter.
#[test]
fn setname_and_portrait() {
    let script = ScriptBuilder::new()
        .op(ControlOp::SetName)
        .u8_(0xeb)
        .eval()
        .op(ControlOp::Portrait)
        .u8_(0xeb)
        .eval()
        .text("I am $Y.\n")
        .op(ControlOp::Bye)
        .build();
    let mut h = harness(4, &script);
    h.world.state.borrow_mut().names.insert(4, "Gwenno".into());
    assert!(h.cx.start(4));
    h.cx.continue_script();
    assert_eq!(h.out.output(), "I am Gwenno.\n");
    assert_eq!(h.out.portraits(), vec![4]);
}

/// Text written after an INPUTNUM stays queued until the digits arrive;
/// the suspension never speaks ahead of itself.
#[test]
fn text_after_a_numeric_request_is_deferred() {
    let script = ScriptBuilder::new()
        .op(ControlOp::Decl)
        .u8_(5)
        .valop(ValOp::Var)
        .op(ControlOp::InputNum)
        .text("Counted.\n")
        .op(ControlOp::Bye)
        .build();
    let mut h = harness(2, &script);
    assert!(h.cx.start(2));
    h.cx.continue_script();
    assert_eq!(h.out.take_output(), "");
    assert!(h.cx.running());

    h.input.feed("3");
    h.cx.continue_script();
    assert_eq!(h.out.take_output(), "Counted.\n");
    assert_eq!(h.cx.get_var(5), 3);
    assert!(!h.cx.running());
}

/// Same rule for INPUT into a string variable.
#[test]
fn text_after_a_line_request_is_deferred() {
    let script = ScriptBuilder::new()
        .op(ControlOp::Decl)
        .u8_(6)
        .valop(ValOp::StrVar)
        .op(ControlOp::Input)
        .text("Noted.\n")
        .op(ControlOp::Bye)
        .build();
    let mut h = harness(2, &script);
    assert!(h.cx.start(2));
    h.cx.continue_script();
    assert_eq!(h.out.take_output(), "");

    h.input.feed("yarn");
    h.cx.continue_script();
    assert_eq!(h.out.take_output(), "Noted.\n");
    assert_eq!(h.cx.get_svar(6), "yarn");
    assert!(!h.cx.running());
}

/// WAIT pauses for a page acknowledgement and resumes on any input.
#[test]
fn page_pause_resumes_on_acknowledgement() {
    let script = ScriptBuilder::new()
        .text("Page one.\n")
        .op(ControlOp::Wait)
        .text("Page two.\n")
        .op(ControlOp::Bye)
        .build();
    let mut h = harness(1, &script);
    assert!(h.cx.start(1));
    h.cx.continue_script();
    assert_eq!(h.out.take_output(), "Page one.\n");
    assert!(h.cx.running());

    h.cx.continue_script();
    assert_eq!(h.out.take_output(), "");

    h.input.feed("");
    h.cx.continue_script();
    assert_eq!(h.out.take_output(), "Page two.\n");
    assert!(!h.cx.running());
}

/// stop() mid-wait tears the conversation down; further ticks and input
/// change nothing.
#[test]
fn stop_is_safe_in_any_state() {
    let script = ScriptBuilder::new()
        .text("Speak.\n")
        .op(ControlOp::Ask)
        .op(ControlOp::Keywords)
        .text("*")
        .op(ControlOp::Answer)
        .text("More.\n")
        .op(ControlOp::EndAnswer)
        .op(ControlOp::Bye)
        .build();
    let mut h = harness(1, &script);
    assert!(h.cx.start(1));
    h.cx.continue_script();
    assert!(h.cx.running());

    h.cx.stop();
    assert!(!h.cx.running());

    h.input.feed("anything");
    h.cx.continue_script();
    assert_eq!(h.out.take_output(), "Speak.\n");
    h.cx.stop();
}

/// Inventory statements and queries travel through the world trait.
#[test]
fn inventory_effects_and_queries() {
    let script = ScriptBuilder::new()
        .op(ControlOp::New)
        .u8_(0xeb)
        .eval()
        .u16_(0x40)
        .eval()
        .u8_(0)
        .eval()
        .u8_(3)
        .eval()
        .op(ControlOp::If)
        .u8_(0xeb)
        .u16_(0x40)
        .valop(ValOp::ObjCount)
        .u8_(0)
        .valop(ValOp::Gt)
        .eval()
        .text("Stocked.\n")
        .op(ControlOp::EndIf)
        .op(ControlOp::Give)
        .u16_(0x40)
        .eval()
        .u8_(0)
        .eval()
        .u8_(0xeb)
        .eval()
        .u8_(0)
        .eval()
        .op(ControlOp::Heal)
        .u8_(0xeb)
        .eval()
        .op(ControlOp::WorkType)
        .u8_(0xeb)
        .eval()
        .u8_(2)
        .eval()
        .op(ControlOp::Bye)
        .build();
    let mut h = harness(6, &script);
    assert!(h.cx.start(6));
    h.cx.continue_script();
    assert_eq!(h.out.output(), "Stocked.\n");
    let w = h.world.state.borrow();
    assert_eq!(w.created, vec![(6, 0x40, 0, 3)]);
    assert_eq!(w.given, vec![(0x40, 0, 6, 0)]);
    assert_eq!(w.healed, vec![6]);
    assert_eq!(w.worktypes.get(&6), Some(&2));
}

/// Starting a second conversation tears the first down; the session is
/// not reentrant.
#[test]
fn restart_replaces_the_active_conversation() {
    let a = ScriptBuilder::new()
        .text("First.\n")
        .op(ControlOp::Ask)
        .op(ControlOp::Bye)
        .build();
    let b = ScriptBuilder::new()
        .text("Second.\n")
        .op(ControlOp::Bye)
        .build();
    let out = Recorder::default();
    let input = ScriptedInput::default();
    let world = TestWorld::default();
    let mut cx = Session::new(TalkConfig::default());
    cx.init(
        Box::new(out.clone()),
        Box::new(input.clone()),
        Box::new(world.clone()),
    )
    .unwrap();
    cx.bind_source(archive(&[(1, &a), (2, &b)]));

    assert!(cx.start(1));
    cx.continue_script();
    assert!(cx.running());

    assert!(cx.start(2));
    cx.continue_script();
    assert!(!cx.running());
    assert_eq!(out.output(), "First.\nSecond.\n");
}

/// The compatibility option recruits whoever is talked to.
#[test]
fn party_all_the_time_recruits_on_start() {
    let script = ScriptBuilder::new().text("Hi.\n").op(ControlOp::Bye).build();
    let config = TalkConfigBuilder::new().with_party_all_the_time(true).get();
    let mut h = harness_with(config, 5, &script);
    assert!(h.cx.start(5));
    h.cx.continue_script();
    assert_eq!(h.world.state.borrow().joined, vec![5]);
}

/// Containers are searched in bind order, so a script split across two
/// archives resolves like the converse.a/converse.b pair.
#[test]
fn scripts_resolve_across_bound_sources() {
    let a = ScriptBuilder::new().text("From a.\n").op(ControlOp::Bye).build();
    let b = ScriptBuilder::new().text("From b.\n").op(ControlOp::Bye).build();
    let out = Recorder::default();
    let mut cx = Session::new(TalkConfig::default());
    cx.init(
        Box::new(out.clone()),
        Box::new(ScriptedInput::default()),
        Box::new(TestWorld::default()),
    )
    .unwrap();
    // item 2 is an empty slot in the first archive
    cx.bind_source(archive(&[(1, &a)]));
    cx.bind_source(archive(&[(2, &b)]));

    assert!(cx.start(1));
    cx.continue_script();
    assert!(cx.start(2));
    cx.continue_script();
    assert_eq!(out.output(), "From a.\nFrom b.\n");

    cx.unload_conv();
    assert!(!cx.start(1));
}
