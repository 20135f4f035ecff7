//! String collation at primary ("base") strength with the Italian tailoring:
//! letters compare equal regardless of case or diacritics, so `"Ōkami"`,
//! `"okami"` and `"OKAMI"` tie.
use icu_collator::{Collator, CollatorOptions, Strength};
use icu_locid::locale;
use std::cmp::Ordering;
use tracing::warn;

thread_local! {
    static COLLATOR: Option<Collator> = {
        let mut options = CollatorOptions::new();
        options.strength = Some(Strength::Primary);
        match Collator::try_new(&locale!("it").into(), options) {
            Ok(collator) => Some(collator),
            Err(e) => {
                warn!(error = %e, "No collation data, comparing lower-cased text");
                None
            }
        }
    };
}

pub fn collate(a: &str, b: &str) -> Ordering {
    COLLATOR.with(|collator| match collator {
        Some(collator) => collator.compare(a, b),
        None => a.to_lowercase().cmp(&b.to_lowercase()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Ōkami", "okami", Ordering::Equal)]
    #[case("Città", "CITTA", Ordering::Equal)]
    #[case("Élan", "elder", Ordering::Less)]
    #[case("zelda", "Ábzû", Ordering::Greater)]
    #[case("Halo", "Halo 2", Ordering::Less)]
    #[case("", "a", Ordering::Less)]
    #[case("Ørsted", "Orsted", Ordering::Equal)]
    #[case("Ørsted", "Zelda", Ordering::Less)]
    #[case("Æon", "Aeon", Ordering::Equal)]
    #[case("Łódź", "Lodz", Ordering::Equal)]
    #[case("Straße", "Strasse", Ordering::Equal)]
    #[case("~x", "a", Ordering::Less)]
    fn compares_at_base_strength(#[case] a: &str, #[case] b: &str, #[case] expected: Ordering) {
        assert_eq!(collate(a, b), expected);
        assert_eq!(collate(b, a), expected.reverse());
    }
}
