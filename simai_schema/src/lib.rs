use serde::{Deserialize, Serialize};

/// Number of difficulty slots in a simai file (`&inote_1` .. `&inote_7`).
pub const DIFFICULTY_COUNT: usize = 7;

/// Touch sensor area. Area `C` is the single center sensor and carries no
/// key digit; every other area is paired with a key position 1..=8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TouchArea {
    A,
    B,
    C,
    D,
    E,
}

impl TouchArea {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'A' => Some(Self::A),
            'B' => Some(Self::B),
            'C' => Some(Self::C),
            'D' => Some(Self::D),
            'E' => Some(Self::E),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
            Self::E => 'E',
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Note {
    /// Key position on the ring, 1..=8. For touch notes on area `C` this is
    /// fixed at 8 (the center sensor is laid out as "key 8").
    pub start_position: u8,
    #[serde(flatten)]
    pub kind: NoteKind,
    #[serde(default)]
    pub is_break: bool,
    #[serde(default)]
    pub is_ex: bool,
    #[serde(default)]
    pub is_hanabi: bool,
    #[serde(default)]
    pub is_force_star: bool,
    #[serde(default)]
    pub is_fake_rotate: bool,
    #[serde(default)]
    pub is_mine: bool,
    #[serde(default = "default_true")]
    pub uses_sub_velocity: bool,
    /// Whatever modifier text was left after classification; kept for
    /// diagnostics and star rendering.
    #[serde(default)]
    pub raw_modifiers: String,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum NoteKind {
    #[serde(rename = "tap")]
    Tap,

    #[serde(rename = "hold")]
    Hold { duration_seconds: f64 },

    #[serde(rename = "touch")]
    Touch { area: TouchArea },

    #[serde(rename = "touch_hold")]
    TouchHold { area: TouchArea, duration_seconds: f64 },

    #[serde(rename = "slide")]
    Slide {
        /// Seconds between the note instant and the moment the star starts
        /// moving. `!` forces 0; otherwise this is the evaluated wait.
        start_delay_seconds: f64,
        duration_seconds: f64,
        /// Set for `!`/`?` slides and for the tail paths of a same-origin
        /// chain; the slide draws no head marker of its own.
        no_head: bool,
        is_slide_break: bool,
        is_mine_on_body: bool,
    },
}

impl NoteKind {
    pub fn is_slide(&self) -> bool {
        matches!(self, NoteKind::Slide { .. })
    }

    pub fn touch_area(&self) -> Option<TouchArea> {
        match self {
            NoteKind::Touch { area } | NoteKind::TouchHold { area, .. } => Some(*area),
            _ => None,
        }
    }

    pub fn duration_seconds(&self) -> Option<f64> {
        match self {
            NoteKind::Tap | NoteKind::Touch { .. } => None,
            NoteKind::Hold { duration_seconds }
            | NoteKind::TouchHold {
                duration_seconds, ..
            }
            | NoteKind::Slide {
                duration_seconds, ..
            } => Some(*duration_seconds),
        }
    }
}

/// One decoded beat group: every note that fires at `time_seconds`.
///
/// Fake-each expansion produces extra groups offset from the nominal comma
/// instant by multiples of a 1/128 note.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoteGroup {
    pub time_seconds: f64,
    /// Raw group text with whitespace stripped, as scanned between commas.
    pub raw_text: String,
    pub bpm: f32,
    pub h_speed: f32,
    pub sub_velocity: f32,
    pub line: u32,
    pub column: u32,
    pub notes: Vec<Note>,
}

impl NoteGroup {
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

/// One marker per comma in the fumen, whether or not the group carried notes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BeatMarker {
    pub time_seconds: f64,
    pub line: u32,
    pub column: u32,
    pub bpm: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Chart {
    pub level: String,
    pub designer: String,
    /// The raw fumen text this chart was decoded from.
    pub fumen: String,
    pub note_groups: Vec<NoteGroup>,
    pub beat_markers: Vec<BeatMarker>,
}

impl Chart {
    pub fn empty(
        level: impl Into<String>,
        designer: impl Into<String>,
        fumen: impl Into<String>,
    ) -> Self {
        Self {
            level: level.into(),
            designer: designer.into(),
            fumen: fumen.into(),
            note_groups: Vec::new(),
            beat_markers: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.note_groups.is_empty()
    }
}

/// An `&prefix=value` line the metadata reader did not recognize itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimaiCommand {
    pub prefix: String,
    pub value: String,
}

/// Everything the metadata block reader extracts from a `maidata.txt`,
/// before any fumen has been decoded.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SimaiMetadata {
    pub title: String,
    pub artist: String,
    /// `&first=` offset in seconds; 0 when absent or unparseable.
    pub offset: f32,
    pub designers: [String; DIFFICULTY_COUNT],
    pub levels: [String; DIFFICULTY_COUNT],
    pub fumens: [String; DIFFICULTY_COUNT],
    pub commands: Vec<SimaiCommand>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimaiFile {
    pub title: String,
    pub artist: String,
    pub offset: f32,
    pub charts: [Chart; DIFFICULTY_COUNT],
    pub commands: Vec<SimaiCommand>,
}
