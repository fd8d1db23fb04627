//! Registry of known AArch64 instruction-encoding categories.
//!
//! Membership is checked once per requested category, before any pipeline
//! stage is scheduled. The set is fixed at compile time and never mutated.

use std::collections::BTreeSet;

/// All instruction categories the corpus generator understands.
///
/// One entry per encoding class in the AArch64 instruction tables, from the
/// base ISA through SVE/SVE2 and SME/SME2.
pub const KNOWN_CATEGORIES: &[&str] = &[
    "aarch64_misc",
    "addsub_carry",
    "addsub_ext",
    "addsub_imm",
    "addsub_shift",
    "asimdall",
    "asimddiff",
    "asimdelem",
    "asimdext",
    "asimdimm",
    "asimdins",
    "asimdmisc",
    "asimdperm",
    "asimdsame",
    "asimdshf",
    "asimdtbl",
    "asisddiff",
    "asisdelem",
    "asisdlse",
    "asisdlsep",
    "asisdlso",
    "asisdlsop",
    "asisdmisc",
    "asisdone",
    "asisdpair",
    "asisdsame",
    "asisdshf",
    "bfloat16",
    "bitfield",
    "branch_imm",
    "branch_reg",
    "compbranch",
    "condbranch",
    "condcmp_imm",
    "condcmp_reg",
    "condsel",
    "cryptoaes",
    "cryptosha2",
    "cryptosha3",
    "cryptosm3",
    "cryptosm4",
    "cssc",
    "dotproduct",
    "dp_1src",
    "dp_2src",
    "dp_3src",
    "exception",
    "extract",
    "float2fix",
    "float2int",
    "floatccmp",
    "floatcmp",
    "floatdp1",
    "floatdp2",
    "floatdp3",
    "floatimm",
    "floatsel",
    "gcs",
    "ic_system",
    "ldst_imm10",
    "ldst_imm9",
    "ldst_pos",
    "ldst_regoff",
    "ldst_unpriv",
    "ldst_unscaled",
    "ldstexcl",
    "ldstnapair_offs",
    "ldstpair_indexed",
    "ldstpair_off",
    "loadlit",
    "log_imm",
    "log_shift",
    "lse_atomic",
    "lse128_atomic",
    "movewide",
    "pcreladdr",
    "rcpc3",
    "sme_fp_sd",
    "sme_int_sd",
    "sme_ldr",
    "sme_misc",
    "sme_mov",
    "sme_psel",
    "sme_shift",
    "sme_size_12_bhs",
    "sme_size_12_hs",
    "sme_size_22_hsd",
    "sme_size_22",
    "sme_start",
    "sme_stop",
    "sme_str",
    "sme_sz_23",
    "sme2_mov",
    "sme2_movaz",
    "sve_cpy",
    "sve_index",
    "sve_index1",
    "sve_limm",
    "sve_misc",
    "sve_movprfx",
    "sve_pred_zm",
    "sve_shift_pred",
    "sve_shift_tsz_bhsd",
    "sve_shift_tsz_hsd",
    "sve_shift_unpred",
    "sve_size_13",
    "sve_size_bh",
    "sve_size_bhs",
    "sve_size_bhsd",
    "sve_size_hsd",
    "sve_size_hsd2",
    "sve_size_sd",
    "sve_size_sd2",
    "sve_size_tsz_bhs",
    "sve2_urqvs",
    "testbranch",
    "the",
];

/// Immutable set of recognized category names.
///
/// Constructed once at startup and passed by reference into every component
/// that needs membership checks.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    names: BTreeSet<&'static str>,
}

impl CategoryRegistry {
    /// Build the registry from the compiled-in category table.
    pub fn new() -> Self {
        CategoryRegistry {
            names: KNOWN_CATEGORIES.iter().copied().collect(),
        }
    }

    /// Whether `name` is a recognized category.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of registered categories.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the registry is empty (never true for the compiled-in table).
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate all category names in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.names.iter().copied()
    }
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}
