//! The Session Controller: one task per WebSocket connection, carrying a
//! connection through IDLE → LISTENING → TRANSCRIBING → CLASSIFYING →
//! EXECUTING → RESPONDING → IDLE for every utterance.
//!
//! Binary frames are PCM/opus audio chunks streamed to STT; text frames are
//! one of the `voice:*`/`recording:*` JSON kinds below. Every reply is
//! spoken back over `voice:tts-stream` once the turn completes.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use base64::Engine;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::session::{Session, SessionStage};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ClientFrame {
    #[serde(rename = "voice:start")]
    VoiceStart,
    #[serde(rename = "voice:stop")]
    VoiceStop,
    #[serde(rename = "voice:final")]
    VoiceFinal { text: String },
    #[serde(rename = "recording:start")]
    RecordingStart,
    #[serde(rename = "recording:stop")]
    RecordingStop,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ServerFrame {
    #[serde(rename = "voice:start")]
    VoiceStart {
        #[serde(rename = "sessionId")]
        session_id: String,
        #[serde(rename = "sttAvailable")]
        stt_available: bool,
        #[serde(rename = "ttsAvailable")]
        tts_available: bool,
        #[serde(rename = "sttProvider")]
        stt_provider: String,
        #[serde(rename = "ttsProvider")]
        tts_provider: String,
    },
    #[serde(rename = "voice:transcript")]
    VoiceTranscript {
        text: String,
        #[serde(rename = "isFinal")]
        is_final: bool,
    },
    #[serde(rename = "voice:intent")]
    VoiceIntent {
        intent: String,
        entities: serde_json::Value,
        confidence: f32,
    },
    #[serde(rename = "voice:response")]
    VoiceResponse { text: String, result: serde_json::Value },
    #[serde(rename = "voice:tts-stream")]
    VoiceTtsStream { audio: String, format: &'static str },
    /// Reserved for a dispatch outcome that spans more than one async
    /// subtask; no intent currently produces more than one `DispatchOutcome`
    /// per turn, so these are never constructed today. See DESIGN.md.
    #[serde(rename = "task:queued")]
    #[allow(dead_code)]
    TaskQueued {
        #[serde(rename = "taskId")]
        task_id: String,
    },
    #[serde(rename = "task:started")]
    #[allow(dead_code)]
    TaskStarted {
        #[serde(rename = "taskId")]
        task_id: String,
    },
    #[serde(rename = "task:completed")]
    #[allow(dead_code)]
    TaskCompleted {
        #[serde(rename = "taskId")]
        task_id: String,
        result: serde_json::Value,
    },
    #[serde(rename = "task:failed")]
    #[allow(dead_code)]
    TaskFailed {
        #[serde(rename = "taskId")]
        task_id: String,
        message: String,
    },
    #[serde(rename = "error")]
    Error { message: String, category: &'static str },
}

/// Upgrades the connection and hands it to the per-connection controller
/// loop. Named to match the plain-handler convention `http.rs` routes
/// directly with `get(ws_handler)`.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let session = match state.sessions.create() {
        Ok(session) => session,
        Err(err) => {
            tracing::warn!(error = %err, "rejected websocket connection");
            return;
        }
    };
    state.rate_limiters.insert(session.id.clone(), parking_lot::Mutex::new(state.new_rate_limiter()));
    crate::metrics::record_voice_session_started();

    let (mut sink, mut stream) = socket.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ServerFrame>();

    let _ = out_tx.send(ServerFrame::VoiceStart {
        session_id: session.id.clone(),
        stt_available: true,
        tts_available: true,
        stt_provider: state.stt.provider_name().to_string(),
        tts_provider: state.tts.provider_name().to_string(),
    });

    let writer = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            let json = match serde_json::to_string(&frame) {
                Ok(j) => j,
                Err(err) => {
                    tracing::error!(error = %err, "failed to serialize server frame");
                    continue;
                }
            };
            if sink.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    let mut audio_buffer: Vec<u8> = Vec::new();

    while let Some(Ok(message)) = stream.next().await {
        session.touch();
        if let Err(reason) = check_rate_limit(&state, &session, &message) {
            let _ = out_tx.send(ServerFrame::Error { message: reason, category: "rate_limit" });
            continue;
        }

        match message {
            Message::Text(text) => {
                if let Err(err) = handle_text_frame(&state, &session, &text, &mut audio_buffer, &out_tx).await {
                    let _ = out_tx.send(ServerFrame::Error { message: err.to_string(), category: "request" });
                }
            }
            Message::Binary(bytes) => audio_buffer.extend_from_slice(&bytes),
            Message::Close(_) => break,
            _ => {}
        }
    }

    state.sessions.remove(&session.id);
    state.rate_limiters.remove(&session.id);
    writer.abort();
}

fn check_rate_limit(state: &AppState, session: &Session, message: &Message) -> Result<(), String> {
    let Some(limiter) = state.rate_limiters.get(&session.id) else {
        return Ok(());
    };
    let mut limiter = limiter.lock();
    match message {
        Message::Binary(bytes) => limiter.check_audio(bytes.len()).map_err(|e| e.to_string()),
        _ => limiter.check_message().map_err(|e| e.to_string()),
    }
}

async fn handle_text_frame(
    state: &AppState,
    session: &Arc<Session>,
    text: &str,
    audio_buffer: &mut Vec<u8>,
    out_tx: &mpsc::UnboundedSender<ServerFrame>,
) -> crate::error::Result<()> {
    let frame: ClientFrame = serde_json::from_str(text).map_err(|e| crate::error::ServerError::InvalidRequest(e.to_string()))?;

    match frame {
        ClientFrame::VoiceStart => {
            session.set_stage(SessionStage::Listening);
            audio_buffer.clear();
        }
        ClientFrame::VoiceStop => {
            session.set_stage(SessionStage::Transcribing);
            let transcript = if audio_buffer.is_empty() {
                String::new()
            } else {
                let transcript = state
                    .stt
                    .transcribe_chunk(audio_buffer)
                    .await
                    .map_err(|e| crate::error::ServerError::Internal(e.to_string()))?;
                transcript.text
            };
            audio_buffer.clear();
            if transcript.is_empty() {
                session.set_stage(SessionStage::Idle);
            } else {
                let _ = out_tx.send(ServerFrame::VoiceTranscript { text: transcript.clone(), is_final: true });
                run_turn(state, session, &transcript, out_tx).await?;
            }
        }
        ClientFrame::VoiceFinal { text } => {
            let _ = out_tx.send(ServerFrame::VoiceTranscript { text: text.clone(), is_final: true });
            run_turn(state, session, &text, out_tx).await?;
        }
        ClientFrame::RecordingStart => {
            state
                .conversation
                .set_recording(&session.id, true)
                .await
                .map_err(|e| crate::error::ServerError::Internal(e.to_string()))?;
        }
        ClientFrame::RecordingStop => {
            state
                .conversation
                .set_recording(&session.id, false)
                .await
                .map_err(|e| crate::error::ServerError::Internal(e.to_string()))?;
        }
    }
    Ok(())
}

/// Runs one full turn: classify, dispatch, template, speak. The dispatcher
/// resolves every customer/product named in the utterance in one pass, so
/// a turn naming several customers still produces a single `DispatchOutcome`
/// rather than needing a separate `task:*` fan-out.
async fn run_turn(state: &AppState, session: &Arc<Session>, transcript: &str, out_tx: &mpsc::UnboundedSender<ServerFrame>) -> crate::error::Result<()> {
    session.set_stage(SessionStage::Classifying);

    state
        .conversation
        .append_user_message(&session.id, transcript, None, Default::default())
        .await
        .map_err(|e| crate::error::ServerError::Internal(e.to_string()))?;

    let shop_id = state.agent.shop_id().clone();
    let context = state
        .conversation
        .format_context_prompt(&session.id, &shop_id, 10)
        .await
        .map_err(|e| crate::error::ServerError::Internal(e.to_string()))?;

    session.set_stage(SessionStage::Executing);
    let turn = state.agent.handle_turn(&session.id, transcript, &context, None).await.map_err(crate::error::ServerError::from)?;
    session.increment_turn_count();

    let _ = out_tx.send(ServerFrame::VoiceIntent {
        intent: turn.intent.clone(),
        entities: serde_json::to_value(&turn.entities).unwrap_or(serde_json::Value::Null),
        confidence: 1.0,
    });
    crate::metrics::record_business_operation(&turn.intent, turn.outcome.success);

    session.set_stage(SessionStage::Responding);
    state
        .conversation
        .append_assistant_message(&session.id, &turn.reply)
        .await
        .map_err(|e| crate::error::ServerError::Internal(e.to_string()))?;

    let result = serde_json::json!({ "success": turn.outcome.success, "data": turn.outcome.data, "error": turn.outcome.error });
    let _ = out_tx.send(ServerFrame::VoiceResponse { text: turn.reply.clone(), result });

    match state.tts.synthesize(&turn.reply).await {
        Ok(audio) => {
            let encoded = base64::engine::general_purpose::STANDARD.encode(audio);
            let _ = out_tx.send(ServerFrame::VoiceTtsStream { audio: encoded, format: "mp3" });
        }
        Err(err) => tracing::warn!(error = %err, session_id = %session.id, "tts synthesis failed"),
    }

    session.set_stage(SessionStage::Idle);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_frame_parses_voice_final() {
        let frame: ClientFrame = serde_json::from_str(r#"{"type":"voice:final","text":"Rahul ka bill banao"}"#).unwrap();
        assert!(matches!(frame, ClientFrame::VoiceFinal { text } if text == "Rahul ka bill banao"));
    }

    #[test]
    fn client_frame_parses_recording_start() {
        let frame: ClientFrame = serde_json::from_str(r#"{"type":"recording:start"}"#).unwrap();
        assert!(matches!(frame, ClientFrame::RecordingStart));
    }

    #[test]
    fn server_frame_serializes_tagged_voice_start() {
        let frame = ServerFrame::VoiceStart {
            session_id: "abc".to_string(),
            stt_available: true,
            tts_available: true,
            stt_provider: "deepgram".to_string(),
            tts_provider: "elevenlabs".to_string(),
        };
        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains("\"type\":\"voice:start\""));
        assert!(json.contains("\"sessionId\":\"abc\""));
    }

    #[test]
    fn server_frame_serializes_tts_stream() {
        let frame = ServerFrame::VoiceTtsStream { audio: "QUJD".to_string(), format: "mp3" };
        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains("\"type\":\"voice:tts-stream\""));
        assert!(json.contains("\"format\":\"mp3\""));
    }
}
