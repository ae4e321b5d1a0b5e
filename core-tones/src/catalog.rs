//! Tone catalog: the fixed set of tones the engine can play.

use serde::{Deserialize, Serialize};

/// Oscillator waveform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// A playable tone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneDefinition {
    pub id: String,
    pub frequency_hz: f32,
    pub name: String,
    pub description: String,
    pub waveform: Waveform,
}

impl ToneDefinition {
    pub fn new(
        id: impl Into<String>,
        frequency_hz: f32,
        name: impl Into<String>,
        description: impl Into<String>,
        waveform: Waveform,
    ) -> Self {
        Self {
            id: id.into(),
            frequency_hz,
            name: name.into(),
            description: description.into(),
            waveform,
        }
    }
}

/// Immutable, ordered list of tone definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneCatalog {
    tones: Vec<ToneDefinition>,
}

impl ToneCatalog {
    pub fn new(tones: Vec<ToneDefinition>) -> Self {
        Self { tones }
    }

    pub fn get(&self, id: &str) -> Option<&ToneDefinition> {
        self.tones.iter().find(|tone| tone.id == id)
    }

    /// Position of a tone in catalog order.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.tones.iter().position(|tone| tone.id == id)
    }

    pub fn tones(&self) -> &[ToneDefinition] {
        &self.tones
    }

    pub fn len(&self) -> usize {
        self.tones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tones.is_empty()
    }
}

impl Default for ToneCatalog {
    /// Schumann resonance and the nine solfeggio frequencies.
    fn default() -> Self {
        let sine = |id: &str, hz: f32, name: &str, description: &str| {
            ToneDefinition::new(id, hz, name, description, Waveform::Sine)
        };

        Self::new(vec![
            sine("schumann", 7.83, "Schumann", "Erdresonanz"),
            sine("174", 174.0, "174 Hz", "Schmerzlinderung"),
            sine("285", 285.0, "285 Hz", "Geweberegeneration"),
            sine("396", 396.0, "396 Hz", "Befreiung von Angst"),
            sine("417", 417.0, "417 Hz", "Situationen klären"),
            sine("528", 528.0, "528 Hz", "Transformation & Wunder"),
            sine("639", 639.0, "639 Hz", "Verbindungen & Beziehungen"),
            sine("741", 741.0, "741 Hz", "Intuition & Aufwachen"),
            sine("852", 852.0, "852 Hz", "Rückkehr zur geistigen Ordnung"),
            sine("963", 963.0, "963 Hz", "Göttliches Bewusstsein"),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog() {
        let catalog = ToneCatalog::default();
        assert_eq!(catalog.len(), 10);
        assert_eq!(catalog.tones()[0].id, "schumann");
        assert_eq!(catalog.get("528").unwrap().description, "Transformation & Wunder");
        assert!(catalog.tones().iter().all(|t| t.waveform == Waveform::Sine));
        assert_eq!(catalog.position("963"), Some(9));
        assert!(catalog.get("1000").is_none());
    }

    #[test]
    fn test_waveform_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Waveform::Sawtooth).unwrap(),
            "\"sawtooth\""
        );
    }
}
