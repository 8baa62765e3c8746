//! Label command languages
//!
//! The engine treats a label as an opaque template string; the language only
//! decides which clear/reset control sequence precedes each payload and which
//! built-in template is used when the configuration supplies none.

use serde::{Deserialize, Serialize};

/// Built-in TPSL label: company name, barcode text, CODE-128 barcode,
/// description and price, with the copy count embedded in the PRINT directive.
const DEFAULT_TPSL_TEMPLATE: &str = r#"SPEED 2.0
DENSITY 7
DIRECTION 0
SIZE 35MM,25MM
OFFSET 0.000
REFERENCE 0,0
CLS
TEXT 320,5,"2",0,1,1,"{{companyName}}"
TEXT 310,40,"2",0,1,1,"{{barcode_value}}"
BARCODE 300,60,"128",50,0,0,2,10,"{{barcode_value}}"
TEXT 310,120,"1",0,1,1,"{{description}}"
TEXT 310,160,"4",0,1,1,"{{unit_price_integer}}"
PRINT {{copies}}
EOP
"#;

/// Built-in ZPL equivalent of the TPSL layout, repeat count via ^PQ.
const DEFAULT_ZPL_TEMPLATE: &str = r#"^XA
^PW400
^FO40,20^A0N,28,28^FD{{companyName}}^FS
^FO40,60^BY2^BCN,60,Y,N,N^FD{{barcode_value}}^FS
^FO40,150^A0N,24,24^FD{{description}}^FS
^FO40,180^A0N,32,32^FD{{unit_price_integer}}^FS
^PQ{{copies}}
^XZ
"#;

/// Printer command language for label payloads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelLanguage {
    /// TSC printer language (TSPL/TPSL family)
    #[default]
    Tpsl,
    /// Zebra programming language
    Zpl,
}

impl LabelLanguage {
    /// Clear/reset control sequence sent before every payload
    pub fn clear_sequence(&self) -> &'static str {
        match self {
            LabelLanguage::Tpsl => "CLS",
            LabelLanguage::Zpl => "^XA^CLS^XZ",
        }
    }

    /// Built-in label template used when no custom body is configured
    pub fn default_template(&self) -> &'static str {
        match self {
            LabelLanguage::Tpsl => DEFAULT_TPSL_TEMPLATE,
            LabelLanguage::Zpl => DEFAULT_ZPL_TEMPLATE,
        }
    }
}

impl std::fmt::Display for LabelLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LabelLanguage::Tpsl => write!(f, "TPSL"),
            LabelLanguage::Zpl => write!(f, "ZPL"),
        }
    }
}
