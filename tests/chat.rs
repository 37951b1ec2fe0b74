//! Chat loop integration tests
//!
//! Drives a full send → stream → seal → speak cycle against scripted
//! collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use nutriscan::chat::{
    ChatModel, ChatTurn, ConversationSession, ReplyChunk, ReplyPrinter, Role, TokenStream,
};
use nutriscan::persona::{APOLOGY, GREETING};
use nutriscan::voice::{SpeechSynthesizer, VoiceOutputBridge};
use nutriscan::{Error, Result};

/// Model replaying one scripted chunk sequence per send
struct ScriptedModel {
    replies: Mutex<Vec<Vec<Result<String>>>>,
}

impl ScriptedModel {
    fn new(replies: Vec<Vec<Result<String>>>) -> Self {
        Self {
            replies: Mutex::new(replies),
        }
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn stream_reply(&self, _history: &[ChatTurn], _message: &str) -> Result<TokenStream> {
        let chunks = self.replies.lock().unwrap().remove(0);
        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}

/// Synthesizer recording every utterance it is asked to speak
struct RecordingSynth {
    spoken: Mutex<Vec<String>>,
    cancels: AtomicUsize,
}

impl RecordingSynth {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            spoken: Mutex::new(Vec::new()),
            cancels: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for RecordingSynth {
    async fn speak(&self, text: &str) -> Result<()> {
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn reply_streams_seals_and_is_spoken_once() {
    let model = Arc::new(ScriptedModel::new(vec![vec![
        Ok("Try ".to_string()),
        Ok("palak ".to_string()),
        Ok("paneer 💕".to_string()),
    ]]));
    let mut session = ConversationSession::new(model);

    let synth = RecordingSynth::new();
    let mut bridge = VoiceOutputBridge::new(Arc::clone(&synth) as Arc<dyn SpeechSynthesizer>);

    let index = session.send("What should I cook tonight?").await.unwrap();

    let turns = session.turns();
    assert_eq!(turns[0].text, GREETING);
    assert_eq!(turns[index].role, Role::Assistant);
    assert_eq!(turns[index].text, "Try palak paneer 💕");
    assert!(!session.is_sending());

    // The same sealed turn is offered twice, e.g. from two snapshot
    // observers; synthesis must fire exactly once with the full text.
    assert!(bridge.speak_turn(index, &turns[index].text));
    assert!(!bridge.speak_turn(index, &turns[index].text));

    // Let the spawned synthesis task run.
    tokio::task::yield_now().await;
    let spoken = synth.spoken.lock().unwrap().clone();
    assert_eq!(spoken, vec!["Try palak paneer 💕".to_string()]);
}

#[tokio::test]
async fn mid_stream_failure_seals_apology_and_unblocks() {
    let model = Arc::new(ScriptedModel::new(vec![
        vec![
            Ok("I think ".to_string()),
            Ok("you could ".to_string()),
            Err(Error::ChatStream("connection reset".to_string())),
        ],
        vec![Ok("all good now".to_string())],
    ]));
    let mut session = ConversationSession::new(model);

    let index = session.send("dinner ideas?").await.unwrap();

    let turns = session.turns();
    assert_eq!(turns[index].text, APOLOGY);
    assert!(!session.is_sending());

    // The failure did not wedge the session.
    let next = session.send("try again").await.unwrap();
    assert_eq!(session.turns()[next].text, "all good now");
}

#[tokio::test]
async fn each_new_turn_preempts_the_previous_utterance() {
    let synth = RecordingSynth::new();
    let mut bridge = VoiceOutputBridge::new(Arc::clone(&synth) as Arc<dyn SpeechSynthesizer>);

    assert!(bridge.speak_turn(2, "first reply"));
    assert!(bridge.speak_turn(4, "second reply"));
    assert_eq!(bridge.last_spoken(), Some(4));

    // Speaking turn 4 cancelled whatever turn 2 was still playing.
    assert!(synth.cancels.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn disabled_bridge_speaks_nothing() {
    let synth = RecordingSynth::new();
    let mut bridge = VoiceOutputBridge::new(Arc::clone(&synth) as Arc<dyn SpeechSynthesizer>);

    bridge.set_enabled(false);
    assert!(!bridge.speak_turn(1, "should stay silent"));

    tokio::task::yield_now().await;
    assert!(synth.spoken.lock().unwrap().is_empty());
}

#[tokio::test]
async fn printer_survives_partial_reply_becoming_apology() {
    // A 50-byte partial chunk, then the stream dies mid-reply. The sealed
    // text is the apology, which is not an extension of the partial, and
    // byte 50 is not a character boundary of it.
    let partial = "Let me think about a nice light dinner for you now".to_string();
    assert_eq!(partial.len(), 50);
    let model = Arc::new(ScriptedModel::new(vec![vec![
        Ok(partial),
        Err(Error::ChatStream("connection reset".to_string())),
    ]]));
    let mut session = ConversationSession::new(model);
    let mut snapshots = session.subscribe();

    let renderer = tokio::spawn(async move {
        let mut printer = ReplyPrinter::new();
        let mut screen = String::new();
        while snapshots.changed().await.is_ok() {
            let turns = snapshots.borrow_and_update().clone();
            let Some(last) = turns.last() else { continue };
            if last.role != Role::Assistant {
                continue;
            }
            match printer.advance(turns.len() - 1, &last.text) {
                Some(ReplyChunk::Append(text)) => screen.push_str(&text),
                Some(ReplyChunk::Replace(text)) => {
                    screen.clear();
                    screen.push_str(&text);
                }
                None => {}
            }
        }
        screen
    });

    session.send("dinner?").await.unwrap();
    drop(session);

    // The renderer kept running and ended on the apology, not a panic.
    let screen = renderer.await.unwrap();
    assert_eq!(screen, APOLOGY);
}

#[tokio::test]
async fn reply_not_spoken_while_still_streaming() {
    let synth = RecordingSynth::new();
    let mut bridge = VoiceOutputBridge::new(Arc::clone(&synth) as Arc<dyn SpeechSynthesizer>);

    let turns = vec![
        ChatTurn {
            role: Role::Assistant,
            text: GREETING.to_string(),
        },
        ChatTurn {
            role: Role::User,
            text: "dinner?".to_string(),
        },
        ChatTurn {
            role: Role::Assistant,
            text: "partial rep".to_string(),
        },
    ];

    // Still streaming: nothing may be synthesized yet.
    assert!(!bridge.speak_reply(&turns, true));
    tokio::task::yield_now().await;
    assert!(synth.spoken.lock().unwrap().is_empty());

    // Sealed: spoken once, and only once.
    assert!(bridge.speak_reply(&turns, false));
    assert!(!bridge.speak_reply(&turns, false));
    tokio::task::yield_now().await;
    assert_eq!(
        synth.spoken.lock().unwrap().clone(),
        vec!["partial rep".to_string()]
    );
}

#[tokio::test]
async fn greeting_alone_is_never_spoken() {
    let synth = RecordingSynth::new();
    let mut bridge = VoiceOutputBridge::new(Arc::clone(&synth) as Arc<dyn SpeechSynthesizer>);

    let turns = vec![ChatTurn {
        role: Role::Assistant,
        text: GREETING.to_string(),
    }];
    assert!(!bridge.speak_reply(&turns, false));
    tokio::task::yield_now().await;
    assert!(synth.spoken.lock().unwrap().is_empty());
}

#[tokio::test]
async fn snapshots_end_with_sealed_turn() {
    let model = Arc::new(ScriptedModel::new(vec![vec![
        Ok("a".to_string()),
        Ok("b".to_string()),
    ]]));
    let mut session = ConversationSession::new(model);
    let mut snapshots = session.subscribe();

    let collector = tokio::spawn(async move {
        let mut seen = Vec::new();
        while snapshots.changed().await.is_ok() {
            seen.push(snapshots.borrow_and_update().clone());
        }
        seen
    });

    session.send("hi").await.unwrap();
    drop(session);

    let seen = collector.await.unwrap();
    let last = seen.last().unwrap();
    // Final snapshot: greeting, user turn, sealed assistant turn.
    assert_eq!(last.len(), 3);
    assert_eq!(last[1].role, Role::User);
    assert_eq!(last[2].text, "ab");
}
