use slug::slugify;

/// 任意文字先转写为 ASCII，非字母数字折叠为单个 `-`，首尾不留 `-`
pub fn generate_slug(title: &str) -> String {
    slugify(title)
}

/// 非空、只含小写字母数字与单个 `-`，且不以 `-` 开头或结尾
pub fn validate_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= 200
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transliterates_turkish_titles() {
        assert_eq!(
            generate_slug("İstanbul'da Güneşli Öğleden Sonra"),
            "istanbul-da-gunesli-ogleden-sonra"
        );
        assert_eq!(generate_slug("ÇIĞIR açan   Şampiyon!"), "cigir-acan-sampiyon");
        assert_eq!(generate_slug("  --2024 Seçim-- "), "2024-secim");
        assert_eq!(generate_slug("!!!"), "");
    }

    #[test]
    fn keeps_accented_letters_from_other_languages() {
        assert_eq!(generate_slug("Café Gündem"), "cafe-gundem");
        assert_eq!(generate_slug("Señor Ñandú"), "senor-nandu");
        assert_eq!(generate_slug("Ångström Ödülü"), "angstrom-odulu");
    }

    #[test]
    fn generated_slugs_validate() {
        for title in ["Ekonomi Gündemi", "Dünya Kupası 2026", "Crème brûlée", "a"] {
            assert!(validate_slug(&generate_slug(title)), "{title}");
        }
        assert!(!validate_slug(""));
        assert!(!validate_slug("-haber"));
        assert!(!validate_slug("haber--spor"));
        assert!(!validate_slug("Haber"));
        assert!(!validate_slug(&"a".repeat(201)));
    }
}
