//! ASS script model and parser.
//!
//! This module parses the subset of Advanced SubStation Alpha scripts the
//! rasterization engine consumes: `[Script Info]` play resolution, `[V4+
//! Styles]` (and legacy `[V4 Styles]`) style definitions, and `[Events]`
//! dialogue lines. Parsing is deliberately forgiving: malformed lines are
//! skipped with a debug log entry, never surfaced as errors, so a broken
//! cue degrades to "nothing to draw" instead of failing playback.

use std::time::Duration;

/// Default play resolution when a script declares none (ASS convention).
const DEFAULT_PLAY_RES_X: f32 = 384.0;
const DEFAULT_PLAY_RES_Y: f32 = 288.0;

/// A parsed ASS style definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    /// Style name referenced by dialogue events.
    pub name: String,
    /// Font family name.
    pub font_name: String,
    /// Font size in play-resolution units.
    pub font_size: f32,
    /// Primary fill colour, straight-alpha RGBA.
    pub primary_colour: [u8; 4],
    /// Bold flag.
    pub bold: bool,
    /// Italic flag.
    pub italic: bool,
    /// Numpad alignment, 1..=9 (1 = bottom left, 2 = bottom centre, ...).
    pub alignment: u8,
    /// Left margin in play-resolution units.
    pub margin_left: f32,
    /// Right margin in play-resolution units.
    pub margin_right: f32,
    /// Vertical margin in play-resolution units.
    pub margin_vertical: f32,
}

impl Default for Style {
    fn default() -> Self {
        Style {
            name: "Default".to_string(),
            font_name: "sans-serif".to_string(),
            font_size: 22.0,
            primary_colour: [255, 255, 255, 255],
            bold: false,
            italic: false,
            alignment: 2,
            margin_left: 10.0,
            margin_right: 10.0,
            margin_vertical: 20.0,
        }
    }
}

/// A parsed dialogue event.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Display start time.
    pub start: Duration,
    /// Display end time (exclusive).
    pub end: Duration,
    /// Name of the style this event uses.
    pub style: String,
    /// Per-event left margin override; `0` keeps the style margin.
    pub margin_left: f32,
    /// Per-event right margin override; `0` keeps the style margin.
    pub margin_right: f32,
    /// Per-event vertical margin override; `0` keeps the style margin.
    pub margin_vertical: f32,
    /// Raw event text, override tags included.
    pub text: String,
}

impl Event {
    /// Returns `true` when the event is on screen at `timestamp`.
    pub fn is_active_at(&self, timestamp: Duration) -> bool {
        self.start <= timestamp && timestamp < self.end
    }
}

/// A parsed ASS script: play resolution, styles, and dialogue events.
#[derive(Debug, Clone, Default)]
pub struct Script {
    /// Script horizontal play resolution.
    pub play_res_x: f32,
    /// Script vertical play resolution.
    pub play_res_y: f32,
    /// Style definitions in declaration order.
    pub styles: Vec<Style>,
    /// Dialogue events in declaration order.
    pub events: Vec<Event>,
}

impl Script {
    /// Look up a style by name, falling back to `Default`, then to the
    /// first declared style.
    pub fn style(&self, name: &str) -> Option<&Style> {
        self.styles
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .or_else(|| {
                self.styles
                    .iter()
                    .find(|s| s.name.eq_ignore_ascii_case("Default"))
            })
            .or_else(|| self.styles.first())
    }

    /// Dialogue events active at `timestamp`, in declaration order.
    pub fn events_at(&self, timestamp: Duration) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(move |e| e.is_active_at(timestamp))
    }
}

/// Section of an ASS script being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    ScriptInfo,
    StylesV4Plus,
    StylesV4,
    Events,
    Other,
}

/// Parse an ASS script.
///
/// Unknown sections and malformed lines are skipped. The result always has
/// a valid play resolution; scripts that declare only one dimension get the
/// other derived at 4:3, matching common renderer behaviour.
pub fn parse(source: &str) -> Script {
    let mut script = Script {
        play_res_x: 0.0,
        play_res_y: 0.0,
        ..Script::default()
    };

    let mut section = Section::Other;
    let mut style_format: Option<Vec<String>> = None;
    let mut event_format: Option<Vec<String>> = None;

    for raw_line in source.lines() {
        let line = raw_line.trim_start_matches('\u{feff}').trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with("!:") {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            let name = line[1..line.len() - 1].trim();
            section = if name.eq_ignore_ascii_case("Script Info") {
                Section::ScriptInfo
            } else if name.eq_ignore_ascii_case("V4+ Styles")
                || name.eq_ignore_ascii_case("V4 Styles+")
            {
                Section::StylesV4Plus
            } else if name.eq_ignore_ascii_case("V4 Styles") {
                Section::StylesV4
            } else if name.eq_ignore_ascii_case("Events") {
                Section::Events
            } else {
                Section::Other
            };
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();

        match section {
            Section::ScriptInfo => {
                if key.eq_ignore_ascii_case("PlayResX") {
                    script.play_res_x = value.parse().unwrap_or(0.0);
                } else if key.eq_ignore_ascii_case("PlayResY") {
                    script.play_res_y = value.parse().unwrap_or(0.0);
                }
            }
            Section::StylesV4Plus | Section::StylesV4 => {
                if key.eq_ignore_ascii_case("Format") {
                    style_format = Some(split_format(value));
                } else if key.eq_ignore_ascii_case("Style") {
                    let legacy = section == Section::StylesV4;
                    match parse_style(value, style_format.as_deref(), legacy) {
                        Some(style) => script.styles.push(style),
                        None => log::debug!("Skipping malformed style line: {line}"),
                    }
                }
            }
            Section::Events => {
                if key.eq_ignore_ascii_case("Format") {
                    event_format = Some(split_format(value));
                } else if key.eq_ignore_ascii_case("Dialogue") {
                    match parse_dialogue(value, event_format.as_deref()) {
                        Some(event) => script.events.push(event),
                        None => log::debug!("Skipping malformed dialogue line: {line}"),
                    }
                }
                // Comment: lines are intentionally ignored.
            }
            Section::Other => {}
        }
    }

    // Resolve a usable play resolution (single-dimension scripts use 4:3).
    if script.play_res_x <= 0.0 && script.play_res_y <= 0.0 {
        script.play_res_x = DEFAULT_PLAY_RES_X;
        script.play_res_y = DEFAULT_PLAY_RES_Y;
    } else if script.play_res_x <= 0.0 {
        script.play_res_x = script.play_res_y * 4.0 / 3.0;
    } else if script.play_res_y <= 0.0 {
        script.play_res_y = script.play_res_x * 3.0 / 4.0;
    }

    script
}

/// Standard V4+ style column order, used when a section has no Format line.
const STYLE_FORMAT_DEFAULT: &[&str] = &[
    "name",
    "fontname",
    "fontsize",
    "primarycolour",
    "secondarycolour",
    "outlinecolour",
    "backcolour",
    "bold",
    "italic",
    "underline",
    "strikeout",
    "scalex",
    "scaley",
    "spacing",
    "angle",
    "borderstyle",
    "outline",
    "shadow",
    "alignment",
    "marginl",
    "marginr",
    "marginv",
    "encoding",
];

/// Standard event column order, used when a section has no Format line.
const EVENT_FORMAT_DEFAULT: &[&str] = &[
    "layer", "start", "end", "style", "name", "marginl", "marginr", "marginv", "effect", "text",
];

fn split_format(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|column| column.trim().to_ascii_lowercase())
        .collect()
}

fn parse_style(value: &str, format: Option<&[String]>, legacy: bool) -> Option<Style> {
    let columns: Vec<&str> = match format {
        Some(format) => {
            let fields: Vec<&str> = value.splitn(format.len(), ',').collect();
            fields
        }
        None => value.splitn(STYLE_FORMAT_DEFAULT.len(), ',').collect(),
    };

    let field = |name: &str| -> Option<&str> {
        let index = match format {
            Some(format) => format.iter().position(|c| c == name)?,
            None => STYLE_FORMAT_DEFAULT.iter().position(|c| *c == name)?,
        };
        columns.get(index).map(|v| v.trim())
    };

    let mut style = Style {
        name: field("name")?.to_string(),
        ..Style::default()
    };
    if let Some(font) = field("fontname") {
        style.font_name = font.to_string();
    }
    if let Some(size) = field("fontsize").and_then(|v| v.parse::<f32>().ok()) {
        style.font_size = size;
    }
    if let Some(colour) = field("primarycolour").and_then(parse_colour) {
        style.primary_colour = colour;
    }
    style.bold = field("bold").map(is_flag_set).unwrap_or(false);
    style.italic = field("italic").map(is_flag_set).unwrap_or(false);
    if let Some(alignment) = field("alignment").and_then(|v| v.parse::<u8>().ok()) {
        style.alignment = if legacy {
            legacy_alignment(alignment)
        } else {
            alignment.clamp(1, 9)
        };
    }
    if let Some(margin) = field("marginl").and_then(|v| v.parse::<f32>().ok()) {
        style.margin_left = margin;
    }
    if let Some(margin) = field("marginr").and_then(|v| v.parse::<f32>().ok()) {
        style.margin_right = margin;
    }
    if let Some(margin) = field("marginv").and_then(|v| v.parse::<f32>().ok()) {
        style.margin_vertical = margin;
    }
    Some(style)
}

fn parse_dialogue(value: &str, format: Option<&[String]>) -> Option<Event> {
    let format_columns: &[String];
    let default_columns: Vec<String>;
    match format {
        Some(columns) => format_columns = columns,
        None => {
            default_columns = EVENT_FORMAT_DEFAULT
                .iter()
                .map(|c| c.to_string())
                .collect();
            format_columns = &default_columns;
        }
    }

    // The text column is last and may itself contain commas.
    let columns: Vec<&str> = value.splitn(format_columns.len(), ',').collect();
    let field = |name: &str| -> Option<&str> {
        let index = format_columns.iter().position(|c| c == name)?;
        columns.get(index).copied()
    };

    let start = parse_timestamp(field("start")?.trim())?;
    let end = parse_timestamp(field("end")?.trim())?;
    let style = field("style").unwrap_or("Default").trim().to_string();
    let margin = |name: &str| {
        field(name)
            .and_then(|v| v.trim().parse::<f32>().ok())
            .unwrap_or(0.0)
    };

    Some(Event {
        start,
        end,
        style,
        margin_left: margin("marginl"),
        margin_right: margin("marginr"),
        margin_vertical: margin("marginv"),
        text: field("text").unwrap_or("").to_string(),
    })
}

/// ASS boolean flags: `-1` (and any non-zero value) means set.
fn is_flag_set(value: &str) -> bool {
    value.parse::<i32>().map(|v| v != 0).unwrap_or(false)
}

/// Map a legacy SSA `\a` alignment code to the V4+ numpad scheme.
fn legacy_alignment(code: u8) -> u8 {
    match code {
        1..=3 => code,
        5 => 7,
        6 => 8,
        7 => 9,
        9 => 4,
        10 => 5,
        11 => 6,
        _ => 2,
    }
}

/// Parse an ASS timestamp of the form `H:MM:SS.cc`.
pub fn parse_timestamp(value: &str) -> Option<Duration> {
    let mut parts = value.splitn(3, ':');
    let hours: u64 = parts.next()?.trim().parse().ok()?;
    let minutes: u64 = parts.next()?.trim().parse().ok()?;
    let seconds: f64 = parts.next()?.trim().parse().ok()?;
    if seconds < 0.0 {
        return None;
    }
    let total = (hours * 3600 + minutes * 60) as f64 + seconds;
    Some(Duration::from_secs_f64(total))
}

/// Parse an ASS colour value into straight-alpha RGBA.
///
/// ASS colours are `&HAABBGGRR&` hexadecimal (alpha `00` = opaque) or a
/// plain decimal `BBGGRR` integer in legacy scripts.
pub fn parse_colour(value: &str) -> Option<[u8; 4]> {
    let trimmed = value.trim().trim_end_matches('&');
    let raw = if let Some(hex) = trimmed
        .strip_prefix("&H")
        .or_else(|| trimmed.strip_prefix("&h"))
    {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        trimmed.parse::<i64>().ok()? as u32
    };

    let ass_alpha = ((raw >> 24) & 0xff) as u8;
    let blue = ((raw >> 16) & 0xff) as u8;
    let green = ((raw >> 8) & 0xff) as u8;
    let red = (raw & 0xff) as u8;
    Some([red, green, blue, 255 - ass_alpha])
}

/// Strip `{\...}` override blocks and drawing commands from event text.
///
/// The engine renders text runs only; inline override tags (positioning,
/// karaoke, animations) are removed so the visible characters remain.
pub fn strip_override_tags(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_tag = false;

    for character in text.chars() {
        if character == '{' && !in_tag {
            in_tag = true;
        } else if character == '}' && in_tag {
            in_tag = false;
        } else if !in_tag {
            result.push(character);
        }
    }

    result
}

/// Split stripped event text into display lines.
///
/// `\N` is a hard break, `\n` a soft break (treated as hard here since no
/// word wrapping is performed), and `\h` a hard space.
pub fn split_lines(text: &str) -> Vec<String> {
    text.replace("\\N", "\n")
        .replace("\\n", "\n")
        .replace("\\h", "\u{a0}")
        .split('\n')
        .map(|line| line.to_string())
        .collect()
}

/// Wrap unstyled text into a minimal ASS script.
///
/// The generated script declares one default style and a single dialogue
/// event covering the whole timeline, so the wrapped cue is visible at any
/// rasterization timestamp. Newlines become `\N` hard breaks; braces are
/// escaped so plain text can never open an override block.
pub fn wrap_plain_text(text: &str) -> String {
    let escaped = text
        .replace('{', "(")
        .replace('}', ")")
        .replace("\r\n", "\n")
        .replace('\n', "\\N");

    format!(
        "[Script Info]\n\
         ScriptType: v4.00+\n\
         PlayResX: 384\n\
         PlayResY: 288\n\
         \n\
         [V4+ Styles]\n\
         Format: Name, Fontname, Fontsize, PrimaryColour, Bold, Italic, Alignment, MarginL, MarginR, MarginV\n\
         Style: Default,sans-serif,22,&H00FFFFFF,0,0,2,10,10,20\n\
         \n\
         [Events]\n\
         Format: Layer, Start, End, Style, MarginL, MarginR, MarginV, Text\n\
         Dialogue: 0,0:00:00.00,9:59:59.99,Default,0,0,0,{escaped}\n"
    )
}
