//! Distance fade and filter keyword selection

use bitflags::bitflags;
use glam::Vec4;

use super::settings::{FilterQuality, ShadowSettings};
use crate::context::UniformSink;

/// Shader keywords of the three directional PCF kernels, in filter order.
pub const DIRECTIONAL_FILTER_KEYWORDS: [&str; 3] = [
    "_DIRECTIONAL_PCF3",
    "_DIRECTIONAL_PCF5",
    "_DIRECTIONAL_PCF7",
];

bitflags! {
    /// Directional filter keywords enabled for a frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FilterKeywords: u32 {
        const PCF3 = 1 << 0;
        const PCF5 = 1 << 1;
        const PCF7 = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeFilter {
    /// `(1 / max_distance, 1 / distance_fade, 1 / (1 - f²), 0)` with
    /// `f = 1 - cascade_fade`.
    pub distance_fade: Vec4,
    /// Index into [`DIRECTIONAL_FILTER_KEYWORDS`].
    pub filter_keyword: usize,
}

impl FadeFilter {
    /// Expects validated settings: `cascade_fade` is kept above zero there,
    /// which keeps the third term finite.
    pub fn encode(settings: &ShadowSettings) -> Self {
        let f = 1.0 - settings.directional.cascade_fade;
        Self {
            distance_fade: Vec4::new(
                1.0 / settings.max_distance,
                1.0 / settings.distance_fade,
                1.0 / (1.0 - f * f),
                0.0,
            ),
            filter_keyword: keyword_index(settings.directional.filter),
        }
    }

    pub fn keywords(&self) -> FilterKeywords {
        FilterKeywords::from_bits_truncate(1 << self.filter_keyword)
    }

    /// Enable the selected kernel and disable the other two, whatever the
    /// previous frame left behind.
    pub fn apply_keywords<S>(&self, sink: &mut S)
    where
        S: UniformSink + ?Sized,
    {
        for (index, keyword) in DIRECTIONAL_FILTER_KEYWORDS.iter().enumerate() {
            if index == self.filter_keyword {
                sink.enable_keyword(keyword);
            } else {
                sink.disable_keyword(keyword);
            }
        }
    }
}

fn keyword_index(filter: FilterQuality) -> usize {
    (filter.level() - 1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn fade_vector_from_settings() {
        let mut settings = ShadowSettings::default();
        settings.max_distance = 50.0;
        settings.distance_fade = 0.2;
        settings.directional.cascade_fade = 0.5;

        let fade = FadeFilter::encode(&settings);
        assert_relative_eq!(fade.distance_fade.x, 0.02);
        assert_relative_eq!(fade.distance_fade.y, 5.0);
        assert_relative_eq!(fade.distance_fade.z, 1.0 / 0.75);
    }

    #[test]
    fn one_keyword_per_filter() {
        let mut settings = ShadowSettings::default();
        for (filter, flag) in [
            (FilterQuality::Pcf3, FilterKeywords::PCF3),
            (FilterQuality::Pcf5, FilterKeywords::PCF5),
            (FilterQuality::Pcf7, FilterKeywords::PCF7),
        ] {
            settings.directional.filter = filter;
            let fade = FadeFilter::encode(&settings);
            assert_eq!(fade.keywords(), flag);
            let name = format!("{filter:?}").to_uppercase();
            assert!(DIRECTIONAL_FILTER_KEYWORDS[fade.filter_keyword].ends_with(&name));
        }
    }
}
