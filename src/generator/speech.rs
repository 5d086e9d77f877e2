use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;
use crate::generator::cache::DiskCache;
use crate::http::{HttpClient, HttpError, Method};

const DEFAULT_PCM_RATE: u32 = 24_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceEngine {
    Native,
    Ai,
}

impl VoiceEngine {
    pub fn label(self) -> &'static str {
        match self {
            VoiceEngine::Native => "device voice",
            VoiceEngine::Ai => "AI voice",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            VoiceEngine::Native => VoiceEngine::Ai,
            VoiceEngine::Ai => VoiceEngine::Native,
        }
    }
}

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("no API key configured for AI speech")]
    MissingApiKey,
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("speech reply carried no audio")]
    NoAudio,
    #[error("invalid audio payload: {0}")]
    InvalidAudio(String),
    #[error("could not run `{command}`: {reason}")]
    Command { command: String, reason: String },
}

/// Synthesized audio as returned by the AI engine, kept as a `data:` URI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpeechAudio {
    pub data_uri: String,
}

impl SpeechAudio {
    pub fn from_base64(mime: &str, data: &str) -> Self {
        Self {
            data_uri: format!("data:{mime};base64,{data}"),
        }
    }

    pub fn mime(&self) -> Option<&str> {
        let rest = self.data_uri.strip_prefix("data:")?;
        rest.split_once(";base64,").map(|(mime, _)| mime)
    }

    pub fn decode(&self) -> Result<Vec<u8>, SpeechError> {
        let (_, payload) = self
            .data_uri
            .split_once(";base64,")
            .ok_or_else(|| SpeechError::InvalidAudio("not a base64 data URI".to_string()))?;
        STANDARD
            .decode(payload)
            .map_err(|e| SpeechError::InvalidAudio(e.to_string()))
    }

    /// File extension matching what `playable_bytes` produces.
    pub fn extension(&self) -> &'static str {
        let mime = self.mime().unwrap_or_default().to_ascii_lowercase();
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence {
            m if is_raw_pcm(m) => "wav",
            "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
            "audio/mpeg" | "audio/mp3" => "mp3",
            "audio/ogg" | "audio/opus" => "ogg",
            "audio/aac" => "aac",
            "audio/flac" => "flac",
            "audio/webm" => "webm",
            _ => "bin",
        }
    }

    /// Bytes ready for a file-based player. Raw `audio/L16` PCM gets a WAV
    /// header; anything else is passed through.
    pub fn playable_bytes(&self) -> Result<Vec<u8>, SpeechError> {
        let bytes = self.decode()?;
        let mime = self.mime().unwrap_or_default().to_ascii_lowercase();
        if is_raw_pcm(&mime) {
            Ok(pcm_to_wav(&bytes, pcm_rate(&mime), 1))
        } else {
            Ok(bytes)
        }
    }
}

/// Every extension `SpeechAudio::extension` can return, for cache lookups.
const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "ogg", "aac", "flac", "webm", "bin"];

fn is_raw_pcm(mime: &str) -> bool {
    mime.starts_with("audio/l16") || mime.contains("pcm")
}

fn pcm_rate(mime: &str) -> u32 {
    mime.split(';')
        .filter_map(|p| p.trim().strip_prefix("rate="))
        .find_map(|r| r.parse().ok())
        .unwrap_or(DEFAULT_PCM_RATE)
}

/// Wrap signed 16-bit little-endian PCM in a RIFF/WAVE container.
pub fn pcm_to_wav(pcm: &[u8], sample_rate: u32, channels: u16) -> Vec<u8> {
    let bits_per_sample: u16 = 16;
    let block_align = channels * bits_per_sample / 8;
    let byte_rate = sample_rate * u32::from(block_align);
    let data_len = pcm.len() as u32;

    let mut wav = Vec::with_capacity(44 + pcm.len());
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&bits_per_sample.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.extend_from_slice(pcm);
    wav
}

pub struct SpeechClient {
    api_key: Option<String>,
    api_base: String,
    tts_model: String,
    ai_voice: String,
    native_command: String,
    native_voice: String,
    player: String,
    http: HttpClient,
    cache: Option<DiskCache>,
}

impl SpeechClient {
    pub fn new(config: &Config, api_key: Option<String>) -> Result<Self, SpeechError> {
        let http = HttpClient::new(Duration::from_secs(config.request_timeout_secs))?;
        Ok(Self {
            api_key,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            tts_model: config.tts_model.clone(),
            ai_voice: config.ai_voice.clone(),
            native_command: config.native_speech_command.clone(),
            native_voice: config.native_voice.clone(),
            player: config.audio_player.clone(),
            http,
            cache: DiskCache::new("audio"),
        })
    }

    pub fn speak(&self, text: &str, engine: VoiceEngine) -> Result<(), SpeechError> {
        match engine {
            VoiceEngine::Native => self.speak_native(text),
            VoiceEngine::Ai => self.speak_ai(text),
        }
    }

    fn speak_native(&self, text: &str) -> Result<(), SpeechError> {
        debug!(command = %self.native_command, "native speech");
        run_quiet(
            Command::new(&self.native_command)
                .arg("-v")
                .arg(&self.native_voice)
                .arg(text),
            &self.native_command,
        )
    }

    fn speak_ai(&self, text: &str) -> Result<(), SpeechError> {
        let stem = DiskCache::digest_stem(&[&self.tts_model, &self.ai_voice, text]);
        if let Some(path) = self
            .cache
            .as_ref()
            .and_then(|cache| cache.find(&stem, AUDIO_EXTENSIONS))
        {
            return self.play_file(&path);
        }

        let audio = self.synthesize(text)?;
        let bytes = audio.playable_bytes()?;
        let key = format!("{stem}.{}", audio.extension());
        match self.cache.as_ref().and_then(|c| c.put(&key, &bytes)) {
            Some(path) => self.play_file(&path),
            None => {
                let path = std::env::temp_dir().join(key);
                std::fs::write(&path, &bytes).map_err(|e| SpeechError::Command {
                    command: self.player.clone(),
                    reason: e.to_string(),
                })?;
                self.play_file(&path)
            }
        }
    }

    pub fn request_body(&self, text: &str) -> Value {
        json!({
            "contents": [{ "parts": [{ "text": text }] }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": self.ai_voice }
                    }
                }
            }
        })
    }

    pub fn synthesize(&self, text: &str) -> Result<SpeechAudio, SpeechError> {
        let api_key = self.api_key.clone().ok_or(SpeechError::MissingApiKey)?;
        info!(voice = %self.ai_voice, chars = text.chars().count(), "synthesizing speech");
        let url = format!(
            "{}/models/{}:generateContent",
            self.api_base, self.tts_model
        );
        let body = self.request_body(text);
        let reply = self
            .http
            .send(Method::Post, &url, &[("x-goog-api-key", api_key)], Some(&body))?
            .ok_or(SpeechError::NoAudio)?;
        extract_audio(&reply)
    }

    fn play_file(&self, path: &Path) -> Result<(), SpeechError> {
        run_quiet(Command::new(&self.player).arg(path), &self.player)
    }
}

fn run_quiet(command: &mut Command, name: &str) -> Result<(), SpeechError> {
    let status = command
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|e| SpeechError::Command {
            command: name.to_string(),
            reason: e.to_string(),
        })?;
    if status.success() {
        Ok(())
    } else {
        Err(SpeechError::Command {
            command: name.to_string(),
            reason: format!("exited with {status}"),
        })
    }
}

/// Find the inline audio part of a TTS reply.
pub fn extract_audio(reply: &Value) -> Result<SpeechAudio, SpeechError> {
    let parts = reply["candidates"]
        .as_array()
        .and_then(|arr| arr.first())
        .and_then(|c| c["content"]["parts"].as_array())
        .ok_or(SpeechError::NoAudio)?;
    parts
        .iter()
        .find_map(|p| {
            let inline = &p["inlineData"];
            let data = inline["data"].as_str()?;
            let mime = inline["mimeType"].as_str().unwrap_or("audio/wav");
            Some(SpeechAudio::from_base64(mime, data))
        })
        .ok_or(SpeechError::NoAudio)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_audio_builds_data_uri() {
        let reply = json!({
            "candidates": [{ "content": { "parts": [{
                "inlineData": { "mimeType": "audio/L16;codec=pcm;rate=24000", "data": "AAAB" }
            }]}}]
        });
        let audio = extract_audio(&reply).unwrap();
        assert_eq!(
            audio.data_uri,
            "data:audio/L16;codec=pcm;rate=24000;base64,AAAB"
        );
        assert_eq!(audio.mime(), Some("audio/L16;codec=pcm;rate=24000"));
        assert_eq!(audio.decode().unwrap(), vec![0, 0, 1]);
    }

    #[test]
    fn test_extract_audio_without_inline_data() {
        let reply = json!({ "candidates": [{ "content": { "parts": [{ "text": "hi" }] } }] });
        assert!(matches!(extract_audio(&reply), Err(SpeechError::NoAudio)));
    }

    #[test]
    fn test_pcm_is_wrapped_in_wav() {
        let audio = SpeechAudio::from_base64("audio/L16;codec=pcm;rate=16000", "AAAAAA==");
        let wav = audio.playable_bytes().unwrap();
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]), 16_000);
        assert_eq!(wav.len(), 44 + 4);
    }

    #[test]
    fn test_non_pcm_passes_through() {
        let audio = SpeechAudio::from_base64("audio/mpeg", "AQID");
        assert_eq!(audio.playable_bytes().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_extension_follows_mime() {
        let ext = |mime: &str| SpeechAudio::from_base64(mime, "AQID").extension();
        assert_eq!(ext("audio/L16;codec=pcm;rate=24000"), "wav");
        assert_eq!(ext("audio/mpeg"), "mp3");
        assert_eq!(ext("audio/ogg; codecs=opus"), "ogg");
        assert_eq!(ext("application/octet-stream"), "bin");
        let mimes = [
            "audio/L16;rate=8000",
            "audio/mpeg",
            "audio/ogg",
            "audio/aac",
            "audio/flac",
            "audio/webm",
            "x/y",
        ];
        for mime in mimes {
            assert!(AUDIO_EXTENSIONS.contains(&ext(mime)));
        }
    }

    #[test]
    fn test_invalid_data_uri() {
        let audio = SpeechAudio {
            data_uri: "not-a-uri".to_string(),
        };
        assert!(matches!(audio.decode(), Err(SpeechError::InvalidAudio(_))));
    }

    #[test]
    fn test_voice_engine_toggle_and_serde() {
        assert_eq!(VoiceEngine::Native.toggled(), VoiceEngine::Ai);
        assert_eq!(serde_json::to_string(&VoiceEngine::Ai).unwrap(), "\"ai\"");
    }

    #[test]
    fn test_synthesize_requires_key() {
        let client = SpeechClient::new(&Config::default(), None).unwrap();
        assert!(matches!(
            client.synthesize("こんにちは"),
            Err(SpeechError::MissingApiKey)
        ));
    }
}
