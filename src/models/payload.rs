use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};

/// Pass threshold applied when a quiz payload carries no positive `pass_score`.
pub const DEFAULT_PASS_SCORE: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Text,
    Video,
    Assignment,
    Quiz,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Text => "text",
            BlockKind::Video => "video",
            BlockKind::Assignment => "assignment",
            BlockKind::Quiz => "quiz",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(BlockKind::Text),
            "video" => Some(BlockKind::Video),
            "assignment" => Some(BlockKind::Assignment),
            "quiz" => Some(BlockKind::Quiz),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoMode {
    Embed,
    File,
}

impl VideoMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoMode::Embed => "embed",
            VideoMode::File => "file",
        }
    }
}

/// Raw authoring fields as they arrive from an edit form. Which of them are
/// meaningful depends on the block kind; the rest are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayloadFields {
    pub title: Option<String>,
    pub text: Option<String>,
    pub image_url: Option<String>,
    pub prompt: Option<String>,
    pub mode: Option<VideoMode>,
    pub url: Option<String>,
    pub src: Option<String>,
    pub pass_score: Option<f64>,
    pub require_pass: Option<bool>,
}

/// Typed view of a block's payload document. This is the only place that
/// knows which fields belong to which kind; everything else hands documents
/// through opaquely or renders the generic [`view_map`].
#[derive(Debug, Clone, PartialEq)]
pub enum BlockPayload {
    Text {
        title: Option<String>,
        text: String,
        image_url: Option<String>,
    },
    Video {
        title: Option<String>,
        mode: VideoMode,
        url: Option<String>,
        src: Option<String>,
    },
    Assignment {
        title: Option<String>,
        prompt: String,
    },
    Quiz {
        title: Option<String>,
        pass_score: Option<f64>,
        require_pass: Option<bool>,
    },
}

impl BlockPayload {
    pub fn kind(&self) -> BlockKind {
        match self {
            BlockPayload::Text { .. } => BlockKind::Text,
            BlockPayload::Video { .. } => BlockKind::Video,
            BlockPayload::Assignment { .. } => BlockKind::Assignment,
            BlockPayload::Quiz { .. } => BlockKind::Quiz,
        }
    }

    /// Builds the typed payload for `kind` out of raw form fields.
    pub fn from_fields(kind: BlockKind, fields: &PayloadFields) -> Self {
        let title = trimmed(fields.title.as_deref());
        match kind {
            BlockKind::Text => BlockPayload::Text {
                title,
                text: fields.text.clone().unwrap_or_default(),
                image_url: trimmed(fields.image_url.as_deref()),
            },
            BlockKind::Video => BlockPayload::Video {
                title,
                mode: fields.mode.unwrap_or(VideoMode::Embed),
                url: trimmed(fields.url.as_deref()),
                src: trimmed(fields.src.as_deref()),
            },
            BlockKind::Assignment => BlockPayload::Assignment {
                title,
                prompt: fields.prompt.clone().unwrap_or_default(),
            },
            BlockKind::Quiz => BlockPayload::Quiz {
                title,
                pass_score: fields.pass_score,
                require_pass: fields.require_pass,
            },
        }
    }

    /// Serializes to the stored document. Video fields are additionally
    /// mirrored under their legacy names (`url` -> `video_url`,
    /// `src` -> `path`) so payloads written by older authoring tools and the
    /// current ones stay interchangeable.
    pub fn encode(&self) -> JsonValue {
        let mut doc = Map::new();
        match self {
            BlockPayload::Text {
                title,
                text,
                image_url,
            } => {
                put_title(&mut doc, title);
                doc.insert("text".to_string(), json!(text));
                if let Some(img) = image_url {
                    doc.insert("image_url".to_string(), json!(img));
                }
            }
            BlockPayload::Assignment { title, prompt } => {
                put_title(&mut doc, title);
                doc.insert("prompt".to_string(), json!(prompt));
            }
            BlockPayload::Video {
                title,
                mode,
                url,
                src,
            } => {
                put_title(&mut doc, title);
                doc.insert("mode".to_string(), json!(mode.as_str()));
                if let Some(u) = url {
                    doc.insert("url".to_string(), json!(u));
                    doc.insert("video_url".to_string(), json!(u));
                }
                if let Some(s) = src {
                    doc.insert("src".to_string(), json!(s));
                    doc.insert("path".to_string(), json!(s));
                }
            }
            BlockPayload::Quiz {
                title,
                pass_score,
                require_pass,
            } => {
                put_title(&mut doc, title);
                if let Some(ps) = pass_score {
                    doc.insert("pass_score".to_string(), json!(ps));
                }
                if let Some(rp) = require_pass {
                    doc.insert("require_pass".to_string(), json!(rp));
                }
            }
        }
        JsonValue::Object(doc)
    }

    /// Reconstructs the typed payload for `kind` from a stored document.
    /// Canonical keys win over legacy aliases; missing or malformed fields
    /// fall back to defaults instead of failing.
    pub fn decode(kind: BlockKind, doc: &JsonValue) -> Self {
        let title = get_str(doc, "title");
        match kind {
            BlockKind::Text => BlockPayload::Text {
                title,
                text: get_str(doc, "text").unwrap_or_default(),
                image_url: get_str(doc, "image_url"),
            },
            BlockKind::Assignment => BlockPayload::Assignment {
                title,
                prompt: get_str(doc, "prompt").unwrap_or_default(),
            },
            BlockKind::Video => BlockPayload::Video {
                title,
                mode: match get_str(doc, "mode").as_deref() {
                    Some("file") => VideoMode::File,
                    _ => VideoMode::Embed,
                },
                url: get_str(doc, "url").or_else(|| get_str(doc, "video_url")),
                src: get_str(doc, "src").or_else(|| get_str(doc, "path")),
            },
            BlockKind::Quiz => BlockPayload::Quiz {
                title,
                pass_score: doc.get("pass_score").and_then(JsonValue::as_f64),
                require_pass: doc.get("require_pass").and_then(JsonValue::as_bool),
            },
        }
    }
}

/// Generic key/value view of a payload document for rendering. Unknown,
/// missing, or non-object documents come back as an empty map.
pub fn view_map(doc: &JsonValue) -> Map<String, JsonValue> {
    match doc {
        JsonValue::Object(map) => map.clone(),
        _ => Map::new(),
    }
}

/// The quiz pass threshold stored in `doc`, if any.
pub fn pass_score(doc: &JsonValue) -> Option<f64> {
    doc.get("pass_score").and_then(JsonValue::as_f64)
}

/// Threshold actually applied when grading: stored value when positive,
/// otherwise [`DEFAULT_PASS_SCORE`].
pub fn effective_pass_score(doc: &JsonValue) -> f64 {
    pass_score(doc)
        .filter(|ps| *ps > 0.0)
        .unwrap_or(DEFAULT_PASS_SCORE)
}

/// Whether a quiz demands a passed attempt before assignments in the same
/// module accept uploads. Absent means yes.
pub fn require_pass(doc: &JsonValue) -> bool {
    doc.get("require_pass")
        .and_then(JsonValue::as_bool)
        .unwrap_or(true)
}

fn put_title(doc: &mut Map<String, JsonValue>, title: &Option<String>) {
    if let Some(t) = title {
        doc.insert("title".to_string(), json!(t));
    }
}

fn get_str(doc: &JsonValue, key: &str) -> Option<String> {
    doc.get(key)
        .and_then(JsonValue::as_str)
        .map(|s| s.to_string())
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}
