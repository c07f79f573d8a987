//! Model identifiers reported in the information answer

wire_enum! {
    /// Meter model id
    pub enum ModelId: u16 {
        Invalid = 0x0000,
        /// APPA 150 series
        Appa150 = 0x0001,
        /// APPA 155B-158B, BENNING CM 12
        Appa150B = 0x0002,
        Appa208 = 0x0003,
        Appa208B = 0x0004,
        /// APPA 506, Sefram 7351
        Appa506 = 0x0005,
        /// APPA 506B, BENNING MM 12, Sefram 7352B
        Appa506B = 0x0006,
        /// Some 506B units report this id
        Appa506BAlt = 0x0600,
        Appa501 = 0x0007,
        Appa502 = 0x0008,
        /// APPA S1, RS PRO S1
        S1 = 0x0009,
        /// APPA S2, BENNING MM 10-1, RS PRO S2
        S2 = 0x000a,
        /// APPA S3, BENNING MM 10-PV, RS PRO S3
        S3 = 0x000b,
        /// APPA 172B, BENNING CM 9-2
        Appa172 = 0x000c,
        /// APPA 173B, BENNING CM 10-1
        Appa173 = 0x000d,
        Appa175 = 0x000e,
        /// APPA 177B, BENNING CM 10-PV
        Appa177 = 0x000f,
        SFlex10A = 0x0010,
        SFlex18A = 0x0011,
        A17N = 0x0012,
        S0 = 0x0013,
        Appa179 = 0x0014,
        Appa503 = 0x0015,
        Appa505 = 0x0016,
    }
}

/// Hardware family, decides storage layout and display count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModelFamily {
    Series150,
    Series200,
    Series500,
    Series170,
    SeriesS,
    SFlex,
    A17N,
    Unknown,
}

impl ModelId {
    /// Model name as printed on the meter
    pub fn name(self) -> &'static str {
        match self {
            ModelId::Invalid => "invalid",
            ModelId::Appa150 => "150",
            ModelId::Appa150B => "150B",
            ModelId::Appa208 => "208",
            ModelId::Appa208B => "208B",
            ModelId::Appa506 => "506",
            ModelId::Appa506B | ModelId::Appa506BAlt => "506B",
            ModelId::Appa501 => "501",
            ModelId::Appa502 => "502",
            ModelId::S1 => "S1",
            ModelId::S2 => "S2",
            ModelId::S3 => "S3",
            ModelId::Appa172 => "172",
            ModelId::Appa173 => "173",
            ModelId::Appa175 => "175",
            ModelId::Appa177 => "177",
            ModelId::SFlex10A => "sFlex-10A",
            ModelId::SFlex18A => "sFlex-18A",
            ModelId::A17N => "A17N",
            ModelId::S0 => "S0",
            ModelId::Appa179 => "179",
            ModelId::Appa503 => "503",
            ModelId::Appa505 => "505",
            ModelId::Unknown(_) => "unknown",
        }
    }

    pub fn family(self) -> ModelFamily {
        match self {
            ModelId::Appa150 | ModelId::Appa150B => ModelFamily::Series150,
            ModelId::Appa208 | ModelId::Appa208B => ModelFamily::Series200,
            ModelId::Appa501
            | ModelId::Appa502
            | ModelId::Appa503
            | ModelId::Appa505
            | ModelId::Appa506
            | ModelId::Appa506B
            | ModelId::Appa506BAlt => ModelFamily::Series500,
            ModelId::Appa172
            | ModelId::Appa173
            | ModelId::Appa175
            | ModelId::Appa177
            | ModelId::Appa179 => ModelFamily::Series170,
            ModelId::S0 | ModelId::S1 | ModelId::S2 | ModelId::S3 => ModelFamily::SeriesS,
            ModelId::SFlex10A | ModelId::SFlex18A => ModelFamily::SFlex,
            ModelId::A17N => ModelFamily::A17N,
            ModelId::Invalid | ModelId::Unknown(_) => ModelFamily::Unknown,
        }
    }
}
