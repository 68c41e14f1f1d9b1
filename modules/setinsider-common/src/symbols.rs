/// SET50 constituents. Used when `STOCK_SYMBOLS` is not configured.
pub const SET50_SYMBOLS: &[&str] = &[
    "ADVANC", "AOT", "AWC", "BBL", "BDMS", "BEM", "BGRIM", "BH", "BJC", "BTS", "CBG", "CPALL",
    "CPF", "CPN", "CRC", "DTAC", "EA", "EGCO", "GLOBAL", "GPSC", "GULF", "HMPRO", "INTUCH",
    "IRPC", "IVL", "KBANK", "KTB", "KTC", "LH", "MINT", "MTC", "OR", "OSP", "PTT", "PTTEP",
    "PTTGC", "RATCH", "SAWAD", "SCB", "SCC", "SCGP", "TISCO", "TOA", "TOP", "TRUE", "TTB", "TU",
    "BAM", "CENTEL", "DELTA",
];
