//! Voice catalog, delivery styles and the copywriting prompt templates.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceProfile {
    pub id: &'static str,
    pub description: &'static str,
}

pub const VOICES: &[VoiceProfile] = &[
    VoiceProfile { id: "Algieba", description: "Male, crisp and direct" },
    VoiceProfile { id: "Aoede", description: "Female, professional and confident" },
    VoiceProfile { id: "Charon", description: "Male, authoritative and deep" },
    VoiceProfile { id: "Fenrir", description: "Male, deep and intense" },
    VoiceProfile { id: "Kore", description: "Female, calm and soothing" },
    VoiceProfile { id: "Leda", description: "Female, sophisticated and soft" },
    VoiceProfile { id: "Mnemosyne", description: "Female, dreamy and soft" },
    VoiceProfile { id: "Orpheus", description: "Male, resonant and confident" },
    VoiceProfile { id: "Puck", description: "Male, energetic and playful" },
    VoiceProfile { id: "Zephyr", description: "Female, balanced and clear" },
];

pub const DEFAULT_VOICE: &str = "Kore";

pub fn find_voice(id: &str) -> Option<&'static VoiceProfile> {
    VOICES.iter().find(|v| v.id.eq_ignore_ascii_case(id))
}

/// How the synthesized voice should deliver the script. Every style except
/// `Natural` is expressed as an instruction prepended to the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeakingStyle {
    Natural,
    #[default]
    AffiliateFriendly,
    AffiliateHype,
    Cheerful,
    Calm,
    Professional,
    Excited,
    Whisper,
    Storyteller,
    Urgent,
}

impl SpeakingStyle {
    pub const ALL: [SpeakingStyle; 10] = [
        SpeakingStyle::Natural,
        SpeakingStyle::AffiliateFriendly,
        SpeakingStyle::AffiliateHype,
        SpeakingStyle::Cheerful,
        SpeakingStyle::Calm,
        SpeakingStyle::Professional,
        SpeakingStyle::Excited,
        SpeakingStyle::Whisper,
        SpeakingStyle::Storyteller,
        SpeakingStyle::Urgent,
    ];

    pub fn key(self) -> &'static str {
        match self {
            SpeakingStyle::Natural => "natural",
            SpeakingStyle::AffiliateFriendly => "affiliate-friendly",
            SpeakingStyle::AffiliateHype => "affiliate-hype",
            SpeakingStyle::Cheerful => "cheerful",
            SpeakingStyle::Calm => "calm",
            SpeakingStyle::Professional => "professional",
            SpeakingStyle::Excited => "excited",
            SpeakingStyle::Whisper => "whisper",
            SpeakingStyle::Storyteller => "storyteller",
            SpeakingStyle::Urgent => "urgent",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.key() == key.trim())
    }

    pub fn prefix(self) -> &'static str {
        match self {
            SpeakingStyle::Natural => "",
            SpeakingStyle::AffiliateFriendly => "Speak in a friendly and persuasive affiliate tone: ",
            SpeakingStyle::AffiliateHype => "Speak in a high-energy, hyped-up affiliate tone: ",
            SpeakingStyle::Cheerful => "Say cheerfully: ",
            SpeakingStyle::Calm => "Speak in a calm and soothing voice: ",
            SpeakingStyle::Professional => "Say in a professional and informative tone: ",
            SpeakingStyle::Excited => "Exclaim with excitement: ",
            SpeakingStyle::Whisper => "Whisper this softly: ",
            SpeakingStyle::Storyteller => "Speak like a dramatic storyteller: ",
            SpeakingStyle::Urgent => "Speak fast and urgently: ",
        }
    }

    pub fn apply(self, text: &str) -> String {
        format!("{}{}", self.prefix(), text)
    }
}

/// Price shown in affiliate copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceTag {
    /// Shorthand such as `49k`, rendered as "49 ribuan".
    Preset(u32),
    Custom(String),
    Unpriced,
}

impl PriceTag {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let lowered = trimmed.to_ascii_lowercase();
        if lowered.is_empty() || lowered == "none" || lowered == "tanpa harga" {
            return PriceTag::Unpriced;
        }
        if let Some(digits) = lowered.strip_suffix('k') {
            if let Ok(thousands) = digits.parse::<u32>() {
                return PriceTag::Preset(thousands);
            }
        }
        PriceTag::Custom(trimmed.to_string())
    }

    /// Phrase used in the prompt, or `None` when no price should be mentioned.
    pub fn display(&self) -> Option<String> {
        match self {
            PriceTag::Preset(thousands) => Some(format!("{thousands} ribuan")),
            PriceTag::Custom(s) => Some(s.clone()),
            PriceTag::Unpriced => None,
        }
    }
}

pub fn affiliate_script_prompt(category: &str, price: &PriceTag) -> String {
    let price_line = match price.display() {
        Some(p) => format!("Sebutkan dengan jelas bahwa harganya sedang promo menjadi '{p}'.\n"),
        None => String::new(),
    };
    format!(
        "Buat skrip promosi afiliasi TikTok yang sangat singkat (1-3 kalimat), padat, dan persuasif untuk produk dalam kategori '{category}'.\n\
Kalimat harus mengajak audiens untuk segera membeli.\n\
{price_line}\
Gunakan bahasa gaul, antusias, dan ajakan kuat seperti 'gercepin', 'wajib punya', atau 'checkout di keranjang kuning'.\n\
\n\
PENTING: Hanya berikan teks skripnya saja, tanpa judul atau pembuka seperti \"Skrip:\" atau \"Tentu!\".\n\
\n\
Contoh output untuk kategori 'Smartwatch' dan harga '99 ribuan':\n\
Smartwatch secanggih ini harganya cuma 99 ribuan aja, guys! Fitur lengkap, desainnya premium. Buruan gercepin di keranjang kuning sebelum kehabisan!"
    )
}

/// Hashtag body derived from a product name: lowercased, whitespace removed.
pub fn hashtag_slug(product: &str) -> String {
    product
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn tiktok_caption_prompt(product: &str) -> String {
    let slug = hashtag_slug(product);
    format!(
        "Buat deskripsi video TikTok yang menarik dan singkat (1-2 kalimat) untuk mempromosikan produk afiliasi '{product}'. Lanjutkan dengan daftar tagar yang relevan di baris baru.\n\
\n\
PENTING: Jangan sertakan judul atau label seperti \"Deskripsi:\" atau \"Tagar:\". Hanya berikan teks deskripsi dan tagar yang bisa langsung disalin.\n\
\n\
Contoh:\n\
Upgrade gayamu dengan jam tangan canggih ini! Desainnya keren, fiturnya lengkap. Checkout di keranjang kuning!\n\
#racuntiktok #tiktokaffiliate #{slug} #smartwatchkeren"
    )
}

/// Script prompt for an uploaded product photo. The category, when given,
/// is only a hint; the image decides what the product is.
pub fn image_script_prompt(category_hint: Option<&str>) -> String {
    let hint_line = match category_hint.map(str::trim).filter(|h| !h.is_empty()) {
        Some(hint) => format!("Petunjuk kategori produk: '{hint}'. Utamakan apa yang terlihat di gambar.\n"),
        None => String::new(),
    };
    format!(
        "Lihat gambar produk ini dan buat skrip promosi afiliasi TikTok yang sangat singkat (1-3 kalimat), padat, dan persuasif.\n\
Sebutkan produknya sesuai yang terlihat di gambar dan ajak audiens untuk segera membeli.\n\
{hint_line}\
Gunakan bahasa gaul, antusias, dan ajakan kuat seperti 'gercepin' atau 'checkout di keranjang kuning'.\n\
\n\
PENTING: Hanya berikan teks skripnya saja, tanpa judul atau pembuka seperti \"Skrip:\" atau \"Tentu!\"."
    )
}

/// Rewrite prompt for an existing voice-over script.
pub fn optimize_script_prompt(text: &str) -> String {
    format!(
        "Perbaiki skrip voice over TikTok berikut agar lebih menarik, natural saat diucapkan, dan persuasif. \
Pertahankan bahasa, maksud, dan informasi harga yang ada, dan jangan membuatnya lebih panjang dari 3 kalimat.\n\
\n\
PENTING: Hanya berikan teks skrip yang sudah diperbaiki, tanpa penjelasan atau pembuka.\n\
\n\
Skrip:\n\
{text}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_voice_is_in_catalog() {
        assert!(find_voice(DEFAULT_VOICE).is_some());
        assert_eq!(VOICES.len(), 10);
    }

    #[test]
    fn test_find_voice_is_case_insensitive() {
        assert_eq!(find_voice("puck").unwrap().id, "Puck");
        assert!(find_voice("Nobody").is_none());
    }

    #[test]
    fn test_style_keys_round_trip() {
        for style in SpeakingStyle::ALL {
            assert_eq!(SpeakingStyle::from_key(style.key()), Some(style));
        }
        assert!(SpeakingStyle::from_key("shouty").is_none());
    }

    #[test]
    fn test_natural_style_leaves_text_untouched() {
        assert_eq!(SpeakingStyle::Natural.apply("Halo guys"), "Halo guys");
    }

    #[test]
    fn test_style_prefix_is_prepended() {
        assert_eq!(
            SpeakingStyle::Cheerful.apply("Halo guys"),
            "Say cheerfully: Halo guys"
        );
        assert_eq!(SpeakingStyle::default(), SpeakingStyle::AffiliateFriendly);
    }

    #[test]
    fn test_price_tag_parse() {
        assert_eq!(PriceTag::parse("49k"), PriceTag::Preset(49));
        assert_eq!(PriceTag::parse(" 19K "), PriceTag::Preset(19));
        assert_eq!(PriceTag::parse(""), PriceTag::Unpriced);
        assert_eq!(PriceTag::parse("Tanpa Harga"), PriceTag::Unpriced);
        assert_eq!(PriceTag::parse("none"), PriceTag::Unpriced);
        assert_eq!(
            PriceTag::parse("Rp 150.000"),
            PriceTag::Custom("Rp 150.000".to_string())
        );
    }

    #[test]
    fn test_price_tag_display() {
        assert_eq!(PriceTag::Preset(99).display().as_deref(), Some("99 ribuan"));
        assert_eq!(PriceTag::Unpriced.display(), None);
    }

    #[test]
    fn test_affiliate_prompt_mentions_category_and_price() {
        let prompt = affiliate_script_prompt("Power Bank", &PriceTag::Preset(29));
        assert!(prompt.contains("'Power Bank'"));
        assert!(prompt.contains("'29 ribuan'"));
    }

    #[test]
    fn test_affiliate_prompt_without_price_omits_price_line() {
        let prompt = affiliate_script_prompt("Power Bank", &PriceTag::Unpriced);
        assert!(!prompt.contains("sedang promo menjadi"));
    }

    #[test]
    fn test_hashtag_slug() {
        assert_eq!(hashtag_slug("Headset Bluetooth  X1"), "headsetbluetoothx1");
    }

    #[test]
    fn test_tiktok_prompt_contains_slug_hashtag() {
        let prompt = tiktok_caption_prompt("Tas Wanita");
        assert!(prompt.contains("'Tas Wanita'"));
        assert!(prompt.contains("#taswanita"));
    }

    #[test]
    fn test_image_script_prompt_with_hint() {
        let prompt = image_script_prompt(Some(" Sepatu "));
        assert!(prompt.contains("Petunjuk kategori produk: 'Sepatu'"));
        assert!(prompt.contains("keranjang kuning"));
    }

    #[test]
    fn test_image_script_prompt_blank_hint_is_omitted() {
        assert!(!image_script_prompt(Some("  ")).contains("Petunjuk"));
        assert!(!image_script_prompt(None).contains("Petunjuk"));
    }

    #[test]
    fn test_optimize_script_prompt_ends_with_text() {
        let prompt = optimize_script_prompt("Jam tangan murah, beli sekarang.");
        assert!(prompt.ends_with("Skrip:\nJam tangan murah, beli sekarang."));
    }
}
