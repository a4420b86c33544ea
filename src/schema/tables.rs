//! Parameter tables for every scope

use super::{Condition, DefaultValue, JointRule, ParamSpec, ParamType, Requirement, ScopeSchema};
use crate::types::ProductKind;

const BOOL: ParamType = ParamType::Bool;
const TEXT: ParamType = ParamType::Text;
const TIME: ParamType = ParamType::Time;
const OBS: ParamType = ParamType::ObsList;

const ENERGY: ParamType = ParamType::Float {
    min: Some(0.3),
    max: Some(10.0),
};
const POSITIVE: ParamType = ParamType::Float {
    min: Some(0.0),
    max: None,
};
const COUNTS: ParamType = ParamType::Int {
    min: Some(1),
    max: None,
};

const GRADES: ParamType = ParamType::Choice(&["all", "0", "4"]);

const fn required(name: &'static str) -> Requirement {
    Requirement {
        name,
        condition: Condition::Always,
    }
}

const fn required_if(name: &'static str, condition: Condition) -> Requirement {
    Requirement { name, condition }
}

const fn ordered(low: &'static str, high: &'static str, strict: bool) -> JointRule {
    JointRule::Ordered { low, high, strict }
}

const fn exclusive(flag: &'static str, other: &'static str) -> JointRule {
    JointRule::Exclusive { flag, other }
}

pub(super) static GLOBAL: ScopeSchema = ScopeSchema {
    params: &[
        ParamSpec::new("name", "name", TEXT),
        ParamSpec::new("targ", "targ", OBS),
        ParamSpec::new("T0", "T0", TIME),
        ParamSpec::new("SinceT0", "SinceT0", BOOL).with_default(DefaultValue::Bool(true)),
        ParamSpec::new("RA", "RA", ParamType::RightAscension),
        ParamSpec::new("Dec", "Dec", ParamType::Declination),
        ParamSpec::new("centroid", "cent", BOOL).with_default(DefaultValue::Bool(false)),
        ParamSpec::new("centMeth", "centMeth", ParamType::Choice(&["simple", "iterative"])),
        ParamSpec::new(
            "maxCentTries",
            "maxCentTries",
            ParamType::Int {
                min: Some(1),
                max: Some(50),
            },
        )
        .with_default(DefaultValue::Int(10)),
        ParamSpec::new("posErr", "poserr", POSITIVE).with_default(DefaultValue::Float(1.0)),
        ParamSpec::new("sss", "sss", BOOL).with_default(DefaultValue::Bool(false)),
        ParamSpec::new("useSXPS", "useSXPS", BOOL)
            .with_default(DefaultValue::Bool(false))
            .shared(),
        ParamSpec::new("posobs", "posobs", ParamType::Choice(&["all", "user", "hours"]))
            .with_default(DefaultValue::Str("all"))
            .shared(),
        ParamSpec::new("posobstime", "posobstime", POSITIVE).shared(),
        ParamSpec::new("getTargs", "getTargs", BOOL).with_default(DefaultValue::Bool(false)),
        ParamSpec::new("getT0", "getT0", BOOL).with_default(DefaultValue::Bool(false)),
        ParamSpec::new("getCoords", "getCoords", BOOL).with_default(DefaultValue::Bool(false)),
        ParamSpec::new("notify", "notify", BOOL).with_default(DefaultValue::Bool(false)),
        ParamSpec::new("label", "label", TEXT),
    ],
    requirements: &[
        required("name"),
        required_if("targ", Condition::Unless("getTargs")),
        required_if("RA", Condition::Unless("getCoords")),
        required_if("Dec", Condition::Unless("getCoords")),
        required_if(
            "T0",
            Condition::WithProducts {
                unless: "getT0",
                products: &[ProductKind::LightCurve, ProductKind::Spectrum],
            },
        ),
        required_if("centMeth", Condition::WhenTrue("centroid")),
        required_if("posobstime", Condition::WhenEquals("posobs", "hours")),
    ],
    joint: &[
        exclusive("getTargs", "targ"),
        exclusive("getT0", "T0"),
        exclusive("getCoords", "RA"),
        exclusive("getCoords", "Dec"),
    ],
};

pub(super) static LIGHT_CURVE: ScopeSchema = ScopeSchema {
    params: &[
        ParamSpec::new(
            "binMeth",
            "binMeth",
            ParamType::Choice(&["counts", "time", "snapshot", "obsid"]),
        ),
        ParamSpec::new("pcCounts", "pcCounts", COUNTS),
        ParamSpec::new("wtCounts", "wtCounts", COUNTS),
        ParamSpec::new("dynamic", "dynamic", BOOL),
        ParamSpec::new("pcBinTime", "pcBinTime", POSITIVE),
        ParamSpec::new("wtBinTime", "wtBinTime", POSITIVE),
        ParamSpec::new("matchHR", "matchHR", BOOL),
        ParamSpec::new("minEnergy", "minen", ENERGY).with_default(DefaultValue::Float(0.3)),
        ParamSpec::new("maxEnergy", "maxen", ENERGY).with_default(DefaultValue::Float(10.0)),
        ParamSpec::new("softLo", "softlo", ENERGY).with_default(DefaultValue::Float(0.3)),
        ParamSpec::new("softHi", "softhi", ENERGY).with_default(DefaultValue::Float(1.5)),
        ParamSpec::new("hardLo", "hardlo", ENERGY).with_default(DefaultValue::Float(1.5)),
        ParamSpec::new("hardHi", "hardhi", ENERGY).with_default(DefaultValue::Float(10.0)),
        ParamSpec::new("minSig", "minsig", POSITIVE).with_default(DefaultValue::Float(3.0)),
        ParamSpec::new("grades", "grades", GRADES).with_default(DefaultValue::Str("all")),
        ParamSpec::new("allowUL", "allowUL", ParamType::Choice(&["no", "pc", "wt", "both"]))
            .with_default(DefaultValue::Str("both")),
        ParamSpec::new("allowBayes", "allowBayes", BOOL).with_default(DefaultValue::Bool(true)),
        ParamSpec::new("bayesCounts", "bayesCounts", COUNTS).with_default(DefaultValue::Int(15)),
        ParamSpec::new("bayesSig", "bayesSig", POSITIVE).with_default(DefaultValue::Float(3.0)),
        ParamSpec::new("timeFormat", "timeType", ParamType::Choice(&["s", "m"]))
            .with_default(DefaultValue::Str("s")),
        ParamSpec::new("minTime", "minTime", TIME),
        ParamSpec::new("maxTime", "maxTime", TIME),
        ParamSpec::new("useObs", "useObs", OBS),
    ],
    requirements: &[
        required("binMeth"),
        required_if("pcCounts", Condition::WhenEquals("binMeth", "counts")),
        required_if("wtCounts", Condition::WhenEquals("binMeth", "counts")),
        required_if("dynamic", Condition::WhenEquals("binMeth", "counts")),
        required_if("pcBinTime", Condition::WhenEquals("binMeth", "time")),
        required_if("wtBinTime", Condition::WhenEquals("binMeth", "time")),
        required_if("matchHR", Condition::WhenEquals("binMeth", "time")),
    ],
    joint: &[
        ordered("minEnergy", "maxEnergy", true),
        ordered("softLo", "softHi", true),
        ordered("hardLo", "hardHi", true),
        ordered("softHi", "hardLo", false),
        ordered("minTime", "maxTime", false),
    ],
};

pub(super) static SPECTRUM: ScopeSchema = ScopeSchema {
    params: &[
        ParamSpec::new("hasRedshift", "hasRedshift", BOOL),
        ParamSpec::new(
            "redshift",
            "z",
            ParamType::Float {
                min: Some(0.0),
                max: Some(20.0),
            },
        ),
        ParamSpec::new("galactic", "galactic", BOOL).with_default(DefaultValue::Bool(true)),
        ParamSpec::new(
            "timeslice",
            "timeslice",
            ParamType::Choice(&["single", "user", "snapshot", "obsid"]),
        ),
        ParamSpec::new("grades", "grades", GRADES).with_default(DefaultValue::Str("all")),
        ParamSpec::new("incbad", "incbad", ParamType::Choice(&["yes", "no", "both"]))
            .with_default(DefaultValue::Str("no")),
        ParamSpec::new("useObs", "useObs", OBS),
        ParamSpec::new("specStem", "specStem", TEXT).with_default(DefaultValue::Str("interval")),
        ParamSpec::new("minTime", "minTime", TIME),
        ParamSpec::new("maxTime", "maxTime", TIME),
    ],
    requirements: &[
        required("hasRedshift"),
        required("timeslice"),
        required_if("redshift", Condition::WhenTrue("hasRedshift")),
        required_if("useObs", Condition::WhenEquals("timeslice", "user")),
    ],
    joint: &[ordered("minTime", "maxTime", false)],
};

const POS_RADIUS: ParamType = ParamType::Float {
    min: Some(0.0),
    max: Some(30.0),
};

pub(super) static STANDARD_POS: ScopeSchema = ScopeSchema {
    params: &[
        ParamSpec::new("useObs", "useObs", OBS),
        ParamSpec::new("posRadius", "posRadius", POS_RADIUS).with_default(DefaultValue::Float(20.0)),
    ],
    requirements: &[],
    joint: &[],
};

pub(super) static ENHANCED_POS: ScopeSchema = ScopeSchema {
    params: &[
        ParamSpec::new("useObs", "useObs", OBS),
        ParamSpec::new("posRadius", "posRadius", POS_RADIUS).with_default(DefaultValue::Float(20.0)),
        ParamSpec::new(
            "maxCentTries",
            "maxCentTries",
            ParamType::Int {
                min: Some(1),
                max: Some(50),
            },
        )
        .with_default(DefaultValue::Int(10)),
    ],
    requirements: &[],
    joint: &[],
};

pub(super) static ASTROM_POS: ScopeSchema = ScopeSchema {
    params: &[
        ParamSpec::new("useObs", "useObs", OBS),
        ParamSpec::new("posRadius", "posRadius", POS_RADIUS).with_default(DefaultValue::Float(20.0)),
    ],
    requirements: &[],
    joint: &[],
};

pub(super) static IMAGE: ScopeSchema = ScopeSchema {
    params: &[
        ParamSpec::new(
            "energies",
            "energies",
            ParamType::Choice(&["0.3-10", "0.3-1.5", "1.5-10", "0.3-1.5,1.5-10"]),
        ),
        ParamSpec::new("useObs", "useObs", OBS),
    ],
    requirements: &[required("energies")],
    joint: &[],
};

pub(super) static SOURCE_DET: ScopeSchema = ScopeSchema {
    params: &[
        ParamSpec::new("useObs", "useObs", OBS),
        ParamSpec::new("whichBands", "whichBands", ParamType::Choice(&["all", "total"])),
        ParamSpec::new("fitStrayLight", "fitStray", BOOL).with_default(DefaultValue::Bool(true)),
        ParamSpec::new("whichData", "whichData", ParamType::Choice(&["user", "all"]))
            .with_default(DefaultValue::Str("all")),
    ],
    requirements: &[required("whichBands")],
    joint: &[],
};
