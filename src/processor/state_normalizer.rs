use std::collections::HashMap;

/// Title-cased raw spellings and the canonical state or union territory name
/// they collapse onto. Several variants share one canonical name.
const STATE_MAPPINGS: &[(&str, &str)] = &[
    // Two letter codes
    ("An", "Andaman & Nicobar"),
    ("Ap", "Andhra Pradesh"),
    ("Ar", "Arunachal Pradesh"),
    ("As", "Assam"),
    ("Br", "Bihar"),
    ("Cg", "Chhattisgarh"),
    ("Ch", "Chandigarh"),
    ("Dd", "Dadra And Nagar Haveli And Daman And Diu"),
    ("Dl", "Delhi"),
    ("Dn", "Dadra And Nagar Haveli And Daman And Diu"),
    ("Ga", "Goa"),
    ("Gj", "Gujarat"),
    ("Hp", "Himachal Pradesh"),
    ("Hr", "Haryana"),
    ("Jh", "Jharkhand"),
    ("Jk", "Jammu & Kashmir"),
    ("Ka", "Karnataka"),
    ("Kl", "Kerala"),
    ("La", "Ladakh"),
    ("Ld", "Lakshadweep"),
    ("Mh", "Maharashtra"),
    ("Ml", "Meghalaya"),
    ("Mn", "Manipur"),
    ("Mp", "Madhya Pradesh"),
    ("Mz", "Mizoram"),
    ("Nl", "Nagaland"),
    ("Od", "Odisha"),
    ("Or", "Odisha"),
    ("Pb", "Punjab"),
    ("Py", "Puducherry"),
    ("Rj", "Rajasthan"),
    ("Sk", "Sikkim"),
    ("Tg", "Telangana"),
    ("Tn", "Tamil Nadu"),
    ("Tr", "Tripura"),
    ("Ts", "Telangana"),
    ("Ua", "Uttarakhand"),
    ("Uk", "Uttarakhand"),
    ("Up", "Uttar Pradesh"),
    ("Wb", "West Bengal"),
    // Spelling variants and older names
    ("Andaman & Nicobar Islands", "Andaman & Nicobar"),
    ("Andaman And Nicobar", "Andaman & Nicobar"),
    ("Andaman And Nicobar Islands", "Andaman & Nicobar"),
    ("Arunachal", "Arunachal Pradesh"),
    ("Chattisgarh", "Chhattisgarh"),
    ("Chhatisgarh", "Chhattisgarh"),
    ("Dadra And Nagar Haveli", "Dadra And Nagar Haveli And Daman And Diu"),
    ("Daman And Diu", "Dadra And Nagar Haveli And Daman And Diu"),
    ("Gujrat", "Gujarat"),
    ("Jammu And Kashmir", "Jammu & Kashmir"),
    ("Karnatka", "Karnataka"),
    ("Nct Of Delhi", "Delhi"),
    ("New Delhi", "Delhi"),
    ("Orissa", "Odisha"),
    ("Pondicherry", "Puducherry"),
    ("Punjab/Mohali/Zirakpur", "Punjab"),
    ("Rajshthan", "Rajasthan"),
    ("Rajsthan", "Rajasthan"),
    ("Tamilnadu", "Tamil Nadu"),
    ("Telengana", "Telangana"),
    ("Uttaranchal", "Uttarakhand"),
    ("Westbengal", "West Bengal"),
];

/// Canonicalizes free-text ship-to state labels.
#[derive(Debug, Clone)]
pub struct StateNormalizer {
    mappings: HashMap<&'static str, &'static str>,
}

impl StateNormalizer {
    pub fn new() -> Self {
        let mappings = STATE_MAPPINGS.iter().copied().collect();
        StateNormalizer { mappings }
    }

    /// Trims, title-cases and maps a raw label. Unknown labels come back
    /// title-cased but otherwise unchanged.
    pub fn normalize(&self, raw: &str) -> String {
        let cleaned = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        let titled = title_case(&cleaned);

        match self.mappings.get(titled.as_str()) {
            Some(canonical) => (*canonical).to_string(),
            None => titled,
        }
    }

    /// Whether the label hits an entry of the mapping table.
    #[allow(dead_code)]
    pub fn is_mapped(&self, raw: &str) -> bool {
        let cleaned = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        self.mappings.contains_key(title_case(&cleaned).as_str())
    }

    #[allow(dead_code)]
    pub fn canonical_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.mappings.values().copied().collect();
        names.sort();
        names.dedup();
        names
    }
}

impl Default for StateNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Upper-cases every letter that does not follow another letter and
/// lower-cases the rest.
pub fn title_case(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut prev_is_letter = false;

    for c in value.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                result.extend(c.to_lowercase());
            } else {
                result.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            result.push(c);
            prev_is_letter = false;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("west bengal"), "West Bengal");
        assert_eq!(title_case("TAMIL NADU"), "Tamil Nadu");
        assert_eq!(title_case("jammu & kashmir"), "Jammu & Kashmir");
        assert_eq!(title_case("punjab/mohali/zirakpur"), "Punjab/Mohali/Zirakpur");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let normalizer = StateNormalizer::new();

        for canonical in normalizer.canonical_names() {
            assert_eq!(normalizer.normalize(canonical), canonical);
            assert_eq!(
                normalizer.normalize(&normalizer.normalize(canonical)),
                canonical
            );
        }
    }

    #[test]
    fn test_many_to_one_mapping() {
        let normalizer = StateNormalizer::new();

        assert_eq!(normalizer.normalize("ORISSA"), "Odisha");
        assert_eq!(normalizer.normalize("ODISHA"), "Odisha");
        assert_eq!(normalizer.normalize("OR"), "Odisha");
        assert_eq!(normalizer.normalize("rajshthan"), "Rajasthan");
        assert_eq!(normalizer.normalize("RJ"), "Rajasthan");
        assert_eq!(normalizer.normalize("Pondicherry"), "Puducherry");
    }

    #[test]
    fn test_whitespace_and_case_cleanup() {
        let normalizer = StateNormalizer::new();

        assert_eq!(normalizer.normalize("  new   delhi "), "Delhi");
        assert_eq!(normalizer.normalize("\tMAHARASHTRA\n"), "Maharashtra");
        assert_eq!(normalizer.normalize("pb"), "Punjab");
    }

    #[test]
    fn test_unmapped_values_pass_through() {
        let normalizer = StateNormalizer::new();

        assert_eq!(normalizer.normalize("APO"), "Apo");
        assert_eq!(normalizer.normalize("some  place"), "Some Place");
        assert!(!normalizer.is_mapped("some place"));
        assert!(normalizer.is_mapped("orissa"));
        assert_eq!(normalizer.normalize("   "), "");
    }

    #[test]
    fn test_mapping_keys_are_reachable() {
        // Lookups happen on the title-cased value, so every key must already
        // be in title case.
        for (raw, _) in STATE_MAPPINGS {
            assert_eq!(title_case(raw), *raw, "unreachable mapping key {raw}");
        }
    }

    #[test]
    fn test_no_conflicting_duplicates() {
        let mut seen: HashMap<&str, &str> = HashMap::new();

        for (raw, canonical) in STATE_MAPPINGS {
            if let Some(existing) = seen.insert(*raw, *canonical) {
                assert_eq!(
                    existing, *canonical,
                    "{raw} maps to both {existing} and {canonical}"
                );
            }
        }
    }

    #[test]
    fn test_canonical_names_are_not_remapped() {
        let normalizer = StateNormalizer::new();

        for canonical in normalizer.canonical_names() {
            if let Some(target) = normalizer.mappings.get(canonical) {
                assert_eq!(target, &canonical);
            }
        }
    }
}
