//! Distribution of translated text across formatted runs.

use serde::{Deserialize, Serialize};

/// How a translated string is cut into per-run pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SplitPolicy {
    /// Cut purely by the original run length ratios.
    Proportional,
    /// Cut by ratio, then move each cut to a nearby whitespace boundary.
    #[default]
    WordBoundary,
}

impl std::str::FromStr for SplitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "proportional" => Ok(Self::Proportional),
            "word-boundary" | "word_boundary" | "word" => Ok(Self::WordBoundary),
            other => Err(format!("unknown split policy '{}'", other)),
        }
    }
}

/// Split `text` into `weights.len()` pieces whose lengths follow the weights.
///
/// Weights are original run lengths in characters. The pieces always
/// concatenate back to `text`; zero total weight splits evenly.
pub fn distribute(text: &str, weights: &[usize], policy: SplitPolicy) -> Vec<String> {
    match weights.len() {
        0 => return Vec::new(),
        1 => return vec![text.to_string()],
        _ => {}
    }

    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    let uniform;
    let weights = if weights.iter().sum::<usize>() == 0 {
        uniform = vec![1; weights.len()];
        &uniform[..]
    } else {
        weights
    };
    let total: usize = weights.iter().sum();

    let snap = policy == SplitPolicy::WordBoundary && chars.iter().any(|c| c.is_whitespace());
    let radius = (len / (2 * weights.len())).max(1);

    let mut cuts = Vec::with_capacity(weights.len() + 1);
    cuts.push(0);
    let mut cumulative = 0;

    for weight in &weights[..weights.len() - 1] {
        cumulative += weight;
        let previous = *cuts.last().unwrap_or(&0);
        let ideal = ((cumulative * len * 2 + total) / (2 * total)).max(previous);
        let cut = if snap {
            snap_to_boundary(&chars, ideal, previous, radius)
        } else {
            ideal
        };
        cuts.push(cut.min(len));
    }
    cuts.push(len);

    cuts.windows(2)
        .map(|bounds| chars[bounds[0]..bounds[1]].iter().collect())
        .collect()
}

fn is_boundary(chars: &[char], position: usize) -> bool {
    position == 0 || position == chars.len() || chars[position - 1].is_whitespace()
}

/// Nearest whitespace boundary to `ideal` that is not before `floor`.
fn snap_to_boundary(chars: &[char], ideal: usize, floor: usize, radius: usize) -> usize {
    for distance in 0..=radius {
        let forward = ideal + distance;
        if forward <= chars.len() && is_boundary(chars, forward) {
            return forward;
        }
        if let Some(backward) = ideal.checked_sub(distance) {
            if backward >= floor && is_boundary(chars, backward) {
                return backward;
            }
        }
    }
    ideal
}
