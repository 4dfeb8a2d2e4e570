//! Map a base locator plus the display flags to the ordered list of files worth trying.
//!
//! The order is the fallback policy: the most specific variant comes first, and the base locator is always last.
use crate::Locator;

/// One locator to try, and how many pixels per logical pixel it holds if it decodes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Candidate {
    pub locator: Locator,
    pub scale: u32,
}

impl Candidate {
    fn new(locator: Locator, scale: u32) -> Candidate {
        Candidate { locator, scale }
    }
}

fn with_suffix(name: &str, ext: Option<&str>, suffix: &str) -> Locator {
    match ext {
        Some(ext) => Locator::new(format!("{}{}.{}", name, suffix, ext)),
        None => Locator::new(format!("{}{}", name, suffix)),
    }
}

/// Produce the candidates for `locator` in the order they should be tried.
pub fn candidates(locator: &Locator, dark: bool, high_density: bool) -> Vec<Candidate> {
    if !dark && !high_density {
        return vec![Candidate::new(locator.clone(), 1)];
    }

    let (name, ext) = locator.split_extension();
    let mut answer = Vec::with_capacity(4);
    if dark && high_density {
        answer.push(Candidate::new(with_suffix(name, ext, "@2x_dark"), 2));
    }
    if dark {
        answer.push(Candidate::new(with_suffix(name, ext, "_dark"), 1));
    }
    if high_density {
        answer.push(Candidate::new(with_suffix(name, ext, "@2x"), 2));
    }
    answer.push(Candidate::new(locator.clone(), 1));
    answer
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    fn flatten(candidates: &[Candidate]) -> Vec<(&str, u32)> {
        candidates
            .iter()
            .map(|c| (c.locator.as_str(), c.scale))
            .collect()
    }

    #[test]
    fn test_print_icon_lists() {
        let print = Locator::from("icons/print.png");

        assert_eq!(
            flatten(&candidates(&print, false, false)),
            vec![("icons/print.png", 1)]
        );
        assert_eq!(
            flatten(&candidates(&print, true, false)),
            vec![("icons/print_dark.png", 1), ("icons/print.png", 1)]
        );
        assert_eq!(
            flatten(&candidates(&print, false, true)),
            vec![("icons/print@2x.png", 2), ("icons/print.png", 1)]
        );
        assert_eq!(
            flatten(&candidates(&print, true, true)),
            vec![
                ("icons/print@2x_dark.png", 2),
                ("icons/print_dark.png", 1),
                ("icons/print@2x.png", 2),
                ("icons/print.png", 1),
            ]
        );
    }

    #[test]
    fn test_no_extension() {
        let bare = Locator::from("icons.d/print");
        assert_eq!(
            flatten(&candidates(&bare, true, true)),
            vec![
                ("icons.d/print@2x_dark", 2),
                ("icons.d/print_dark", 1),
                ("icons.d/print@2x", 2),
                ("icons.d/print", 1),
            ]
        );
    }

    proptest! {
        #[test]
        fn test_base_locator_is_always_last(
            path in "[a-z]{1,8}(/[a-z]{1,8}){0,3}(\\.[a-z]{1,4})?",
            dark in any::<bool>(),
            high_density in any::<bool>(),
        ) {
            let locator = Locator::new(path);
            let list = candidates(&locator, dark, high_density);

            let expected_len = 1 + dark as usize + high_density as usize + (dark && high_density) as usize;
            prop_assert_eq!(list.len(), expected_len);
            prop_assert_eq!(list.last(), Some(&Candidate::new(locator.clone(), 1)));

            // Every variant except the base is distinct from it, and scale 2 appears only for high-density variants.
            for c in &list[..list.len() - 1] {
                prop_assert_ne!(&c.locator, &locator);
                prop_assert_eq!(c.scale == 2, c.locator.as_str().contains("@2x"));
            }
        }
    }
}
