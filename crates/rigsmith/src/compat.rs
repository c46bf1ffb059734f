//! # Compatibility — Which Part Fits Which Slot
//!
//! Every component root and every mount location carries a [`Compatibility`]
//! value. A slot's value answers one directional question:
//!
//! ```text
//! slot.is_compatible_with(&part)  →  "can a part described by `part` sit here?"
//! ```
//!
//! ## Rules per category
//!
//! | Category                         | Payload             | Rule                          |
//! |----------------------------------|---------------------|-------------------------------|
//! | case                             | none                | same category                 |
//! | motherboard, powersupply, pcie   | ordered size class  | slot class ≥ part class       |
//! | storage, ram, fan                | exact value         | identical, known values       |
//! | cpu                              | socket              | identical, known socket       |
//! | cooler                           | set of sockets      | sets share a known socket     |
//!
//! Unrecognized payload values normalize to an `Unknown` sentinel. For size
//! classes `Unknown` only matches `Unknown`; for exact-match categories it
//! matches nothing.
//!
//! ## Descriptor format
//!
//! Asset metadata stores values as `category[,payload...]`, e.g.
//! `motherboard,ATX`, `fan,120`, or `cooler,"LGA1700,AM5"`. The first token
//! picks a constructor from a static table; unknown categories parse to
//! `None`.

use std::fmt;

// ── Categories ───────────────────────────────────────────────────────────

/// The kind of physical part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Case,
    Motherboard,
    Cpu,
    Pcie,
    Ram,
    Storage,
    PowerSupply,
    Fan,
    Cooler,
}

impl Category {
    /// The descriptor tag for this category.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Case => "case",
            Self::Motherboard => "motherboard",
            Self::Cpu => "cpu",
            Self::Pcie => "pcie",
            Self::Ram => "ram",
            Self::Storage => "storage",
            Self::PowerSupply => "powersupply",
            Self::Fan => "fan",
            Self::Cooler => "cooler",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// ── Payload enums ────────────────────────────────────────────────────────

/// Expands a payload enum with a token table and an `Unknown` fallback.
macro_rules! payload_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $token:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            Unknown,
        }

        impl $name {
            /// Parse a descriptor token. Unrecognized tokens become `Unknown`.
            pub fn from_token(token: &str) -> Self {
                match token.trim() {
                    $($token => Self::$variant,)+
                    _ => Self::Unknown,
                }
            }

            pub fn token(self) -> &'static str {
                match self {
                    $(Self::$variant => $token,)+
                    Self::Unknown => "Unknown",
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.token())
            }
        }
    };
}

payload_enum! {
    /// Motherboard form factor.
    BoardSize {
        SsiCeb => "SSICEB",
        SsiEeb => "SSIEEB",
        ExtendedAtx => "ExtendedATX",
        Atx => "ATX",
        MicroAtx => "MicroATX",
        FlexAtx => "FlexATX",
        Itx => "ITX",
        MiniDtx => "MiniDTX",
        MiniItx => "MiniITX",
    }
}

payload_enum! {
    /// Power supply form factor.
    PsuSize {
        Atx => "ATX",
        Sfx => "SFX",
        Tfx => "TFX",
    }
}

payload_enum! {
    /// PCIe lane width.
    PcieWidth {
        X1 => "x1",
        X4 => "x4",
        X8 => "x8",
        X16 => "x16",
    }
}

payload_enum! {
    /// Storage interface.
    StorageKind {
        Hdd => "HDD",
        SataSsd => "SATASSD",
        M2Ssd => "M2SSD",
        NvmeSsd => "NVMESSD",
    }
}

payload_enum! {
    /// RAM generation.
    RamKind {
        Ddr3 => "DDR3",
        Ddr4 => "DDR4",
        Ddr5 => "DDR5",
    }
}

payload_enum! {
    /// CPU socket.
    Socket {
        Lga1700 => "LGA1700",
        Lga1200 => "LGA1200",
        Lga1151V2 => "LGA1151V2",
        Lga1151 => "LGA1151",
        Am5 => "AM5",
        Am4 => "AM4",
    }
}

/// A size-ordered payload. Higher rank means larger / more capable; `None`
/// is the `Unknown` class.
trait SizeClass: Copy + Eq + fmt::Display {
    fn rank(self) -> Option<u8>;
}

impl SizeClass for BoardSize {
    fn rank(self) -> Option<u8> {
        match self {
            Self::SsiCeb => Some(8),
            // SSI EEB and Extended ATX share one size class.
            Self::SsiEeb | Self::ExtendedAtx => Some(7),
            Self::Atx => Some(6),
            Self::MicroAtx => Some(5),
            Self::FlexAtx => Some(4),
            Self::Itx => Some(3),
            Self::MiniDtx => Some(2),
            Self::MiniItx => Some(1),
            Self::Unknown => None,
        }
    }
}

impl SizeClass for PsuSize {
    fn rank(self) -> Option<u8> {
        match self {
            Self::Atx => Some(3),
            Self::Sfx => Some(2),
            Self::Tfx => Some(1),
            Self::Unknown => None,
        }
    }
}

impl SizeClass for PcieWidth {
    fn rank(self) -> Option<u8> {
        match self {
            Self::X16 => Some(4),
            Self::X8 => Some(3),
            Self::X4 => Some(2),
            Self::X1 => Some(1),
            Self::Unknown => None,
        }
    }
}

fn fits_size<T: SizeClass>(slot: T, part: T) -> bool {
    match (slot.rank(), part.rank()) {
        (Some(slot), Some(part)) => slot >= part,
        (None, None) => true,
        _ => {
            log::warn!("Unknown size class in comparison: slot {slot}, part {part}");
            false
        }
    }
}

fn same_known<T: Copy + Eq + fmt::Display>(what: &str, slot: T, part: T, unknown: T) -> bool {
    if slot == unknown || part == unknown {
        log::error!("Unknown {what}: slot {slot}, part {part}");
        return false;
    }
    slot == part
}

// ── Compatibility ────────────────────────────────────────────────────────

/// A typed compatibility value, one variant per [`Category`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compatibility {
    Case,
    Motherboard(BoardSize),
    Cpu(Socket),
    Pcie(PcieWidth),
    Ram(RamKind),
    Storage(StorageKind),
    PowerSupply(PsuSize),
    /// Fan frame size in millimetres; `None` when unrecognized.
    Fan(Option<u32>),
    Cooler(Vec<Socket>),
}

type Constructor = fn(&[&str]) -> Compatibility;

/// Descriptor tag → constructor.
const CONSTRUCTORS: &[(&str, Constructor)] = &[
    ("case", |_| Compatibility::Case),
    ("motherboard", |p| Compatibility::Motherboard(BoardSize::from_token(first(p)))),
    ("cpu", |p| Compatibility::Cpu(Socket::from_token(first(p)))),
    ("pcie", |p| Compatibility::Pcie(PcieWidth::from_token(first(p)))),
    ("ram", |p| Compatibility::Ram(RamKind::from_token(first(p)))),
    ("storage", |p| Compatibility::Storage(StorageKind::from_token(first(p)))),
    ("powersupply", |p| Compatibility::PowerSupply(PsuSize::from_token(first(p)))),
    ("fan", |p| Compatibility::Fan(first(p).trim().parse().ok())),
    ("cooler", |p| Compatibility::Cooler(p.iter().map(|s| Socket::from_token(s)).collect())),
];

fn first<'a>(payload: &[&'a str]) -> &'a str {
    payload.first().copied().unwrap_or("")
}

impl Compatibility {
    /// Parse a `category[,payload...]` descriptor.
    ///
    /// Quoted payload tokens are unquoted and split on their inner commas, so
    /// `cooler,"LGA1700,AM5"` and `cooler,LGA1700,AM5` are equivalent.
    pub fn parse(descriptor: &str) -> Option<Self> {
        let tokens = split_top_level(descriptor);
        let (tag, rest) = tokens.split_first()?;
        let tag = tag.trim();
        let (_, constructor) = CONSTRUCTORS.iter().find(|(name, _)| *name == tag)?;

        let payload: Vec<&str> = rest
            .iter()
            .flat_map(|token| token.trim().trim_matches('"').split(','))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .collect();
        Some(constructor(&payload))
    }

    pub fn category(&self) -> Category {
        match self {
            Self::Case => Category::Case,
            Self::Motherboard(_) => Category::Motherboard,
            Self::Cpu(_) => Category::Cpu,
            Self::Pcie(_) => Category::Pcie,
            Self::Ram(_) => Category::Ram,
            Self::Storage(_) => Category::Storage,
            Self::PowerSupply(_) => Category::PowerSupply,
            Self::Fan(_) => Category::Fan,
            Self::Cooler(_) => Category::Cooler,
        }
    }

    /// Whether a part described by `part` may occupy a slot requiring `self`.
    pub fn is_compatible_with(&self, part: &Compatibility) -> bool {
        match (self, part) {
            (Self::Case, Self::Case) => true,
            (Self::Motherboard(slot), Self::Motherboard(part)) => fits_size(*slot, *part),
            (Self::PowerSupply(slot), Self::PowerSupply(part)) => fits_size(*slot, *part),
            (Self::Pcie(slot), Self::Pcie(part)) => fits_size(*slot, *part),
            (Self::Storage(slot), Self::Storage(part)) => {
                same_known("storage kind", *slot, *part, StorageKind::Unknown)
            }
            (Self::Ram(slot), Self::Ram(part)) => same_known("RAM kind", *slot, *part, RamKind::Unknown),
            (Self::Cpu(slot), Self::Cpu(part)) => same_known("CPU socket", *slot, *part, Socket::Unknown),
            (Self::Fan(slot), Self::Fan(part)) => match (slot, part) {
                (Some(slot), Some(part)) => slot == part,
                _ => {
                    log::warn!("Unknown fan size in comparison");
                    false
                }
            },
            (Self::Cooler(slot), Self::Cooler(part)) => {
                if slot.contains(&Socket::Unknown) || part.contains(&Socket::Unknown) {
                    log::error!("Unknown CPU socket in cooler sockets");
                }
                slot.iter()
                    .any(|socket| *socket != Socket::Unknown && part.contains(socket))
            }
            _ => false,
        }
    }
}

impl fmt::Display for Compatibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.category().tag();
        match self {
            Self::Case => f.write_str(tag),
            Self::Motherboard(size) => write!(f, "{tag},{size}"),
            Self::Cpu(socket) => write!(f, "{tag},{socket}"),
            Self::Pcie(width) => write!(f, "{tag},{width}"),
            Self::Ram(kind) => write!(f, "{tag},{kind}"),
            Self::Storage(kind) => write!(f, "{tag},{kind}"),
            Self::PowerSupply(size) => write!(f, "{tag},{size}"),
            Self::Fan(Some(size)) => write!(f, "{tag},{size}"),
            Self::Fan(None) => write!(f, "{tag},Unknown"),
            Self::Cooler(sockets) => {
                let list: Vec<&str> = sockets.iter().map(|s| s.token()).collect();
                write!(f, "{tag},\"{}\"", list.join(","))
            }
        }
    }
}

/// Split on commas that are not inside double quotes. Quotes are kept.
pub(crate) fn split_top_level(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, ch) in input.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compat(descriptor: &str) -> Compatibility {
        Compatibility::parse(descriptor).unwrap()
    }

    #[test]
    fn parse_selects_category() {
        assert_eq!(compat("case"), Compatibility::Case);
        assert_eq!(compat("motherboard,ATX"), Compatibility::Motherboard(BoardSize::Atx));
        assert_eq!(compat("fan,120"), Compatibility::Fan(Some(120)));
        assert_eq!(compat("pcie,x16").category(), Category::Pcie);
    }

    #[test]
    fn parse_rejects_unregistered_category() {
        assert!(Compatibility::parse("monitor,27").is_none());
        assert!(Compatibility::parse("").is_none());
    }

    #[test]
    fn unrecognized_payload_normalizes_to_unknown() {
        assert_eq!(compat("motherboard,BTX"), Compatibility::Motherboard(BoardSize::Unknown));
        assert_eq!(compat("ram,DDR9"), Compatibility::Ram(RamKind::Unknown));
        assert_eq!(compat("fan,big"), Compatibility::Fan(None));
    }

    #[test]
    fn quoted_and_bare_cooler_lists_agree() {
        let quoted = compat("cooler,\"LGA1700,AM5\"");
        let bare = compat("cooler,LGA1700,AM5");
        assert_eq!(quoted, bare);
        assert_eq!(quoted, Compatibility::Cooler(vec![Socket::Lga1700, Socket::Am5]));
    }

    #[test]
    fn size_classes_are_reflexive() {
        for size in ["SSICEB", "SSIEEB", "ExtendedATX", "ATX", "MicroATX", "FlexATX", "ITX", "MiniDTX", "MiniITX"] {
            let c = compat(&format!("motherboard,{size}"));
            assert!(c.is_compatible_with(&c), "{size}");
        }
        for size in ["ATX", "SFX", "TFX"] {
            let c = compat(&format!("powersupply,{size}"));
            assert!(c.is_compatible_with(&c), "{size}");
        }
    }

    #[test]
    fn atx_slot_takes_smaller_boards_only() {
        let slot = compat("motherboard,ATX");
        for part in ["ATX", "MicroATX", "FlexATX", "ITX", "MiniDTX", "MiniITX"] {
            assert!(slot.is_compatible_with(&compat(&format!("motherboard,{part}"))), "{part}");
        }
        for part in ["SSIEEB", "ExtendedATX", "SSICEB"] {
            assert!(!slot.is_compatible_with(&compat(&format!("motherboard,{part}"))), "{part}");
        }
    }

    #[test]
    fn eeb_and_extended_atx_share_a_class() {
        let eeb = compat("motherboard,SSIEEB");
        let eatx = compat("motherboard,ExtendedATX");
        assert!(eeb.is_compatible_with(&eatx));
        assert!(eatx.is_compatible_with(&eeb));
    }

    #[test]
    fn unknown_size_matches_only_unknown() {
        let unknown = compat("motherboard,BTX");
        let atx = compat("motherboard,ATX");
        assert!(unknown.is_compatible_with(&unknown));
        assert!(!unknown.is_compatible_with(&atx));
        assert!(!atx.is_compatible_with(&unknown));
    }

    #[test]
    fn pcie_slot_accepts_narrower_cards() {
        let x16 = compat("pcie,x16");
        let x1 = compat("pcie,x1");
        assert!(x16.is_compatible_with(&x1));
        assert!(!x1.is_compatible_with(&x16));
    }

    #[test]
    fn exact_match_categories() {
        assert!(compat("storage,NVMESSD").is_compatible_with(&compat("storage,NVMESSD")));
        assert!(!compat("storage,NVMESSD").is_compatible_with(&compat("storage,HDD")));
        assert!(compat("ram,DDR4").is_compatible_with(&compat("ram,DDR4")));
        assert!(!compat("ram,DDR4").is_compatible_with(&compat("ram,DDR5")));
        assert!(compat("fan,120").is_compatible_with(&compat("fan,120")));
        assert!(!compat("fan,120").is_compatible_with(&compat("fan,140")));
    }

    #[test]
    fn exact_match_unknown_matches_nothing() {
        let unknown_ram = compat("ram,DDR9");
        assert!(!unknown_ram.is_compatible_with(&unknown_ram));
        let unknown_storage = compat("storage,tape");
        assert!(!unknown_storage.is_compatible_with(&unknown_storage));
        assert!(!compat("cpu,LGA9999").is_compatible_with(&compat("cpu,LGA9999")));
    }

    #[test]
    fn cooler_sockets_intersect() {
        let cooler = compat("cooler,\"LGA1700,AM5\"");
        assert!(compat("cooler,LGA1700").is_compatible_with(&cooler));
        assert!(compat("cooler,AM5").is_compatible_with(&cooler));
        assert!(!compat("cooler,LGA1200").is_compatible_with(&cooler));
    }

    #[test]
    fn categories_never_cross() {
        assert!(compat("case").is_compatible_with(&compat("case")));
        assert!(!compat("case").is_compatible_with(&compat("fan,120")));
        assert!(!compat("fan,120").is_compatible_with(&compat("case")));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for descriptor in ["case", "motherboard,ATX", "fan,120", "cooler,\"LGA1700,AM5\""] {
            assert_eq!(compat(descriptor).to_string(), descriptor);
        }
    }

    #[test]
    fn split_respects_quotes() {
        assert_eq!(split_top_level("a,\"b,c\",d"), vec!["a", "\"b,c\"", "d"]);
        assert_eq!(split_top_level("single"), vec!["single"]);
    }
}
