use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// The eight admission gates, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateName {
    MarketRegime,
    TimeWindow,
    Structure,
    Volatility,
    MomentumTiming,
    StrikeQuality,
    ExpectedMove,
    RiskFeasibility,
}

impl GateName {
    pub const ALL: [GateName; 8] = [
        GateName::MarketRegime,
        GateName::TimeWindow,
        GateName::Structure,
        GateName::Volatility,
        GateName::MomentumTiming,
        GateName::StrikeQuality,
        GateName::ExpectedMove,
        GateName::RiskFeasibility,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GateName::MarketRegime => "market_regime",
            GateName::TimeWindow => "time_window",
            GateName::Structure => "structure",
            GateName::Volatility => "volatility",
            GateName::MomentumTiming => "momentum_timing",
            GateName::StrikeQuality => "strike_quality",
            GateName::ExpectedMove => "expected_move",
            GateName::RiskFeasibility => "risk_feasibility",
        }
    }

    /// A-H label used in logs
    pub fn letter(&self) -> char {
        match self {
            GateName::MarketRegime => 'A',
            GateName::TimeWindow => 'B',
            GateName::Structure => 'C',
            GateName::Volatility => 'D',
            GateName::MomentumTiming => 'E',
            GateName::StrikeQuality => 'F',
            GateName::ExpectedMove => 'G',
            GateName::RiskFeasibility => 'H',
        }
    }
}

impl std::fmt::Display for GateName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateResult {
    pub name: GateName,
    pub passed: bool,
    /// Observed values and thresholds
    pub detail: serde_json::Value,
}

impl GateResult {
    pub fn new(name: GateName, passed: bool, detail: serde_json::Value) -> Self {
        Self { name, passed, detail }
    }
}

/// Complete, fixed-order result of all eight gates.
///
/// Serializes as an ordered map keyed by gate name.
#[derive(Debug, Clone, PartialEq)]
pub struct GateReport {
    results: Vec<GateResult>,
}

impl GateReport {
    /// Results must arrive in `GateName::ALL` order, one per gate.
    pub(crate) fn new(results: Vec<GateResult>) -> Self {
        debug_assert_eq!(results.len(), GateName::ALL.len());
        debug_assert!(results.iter().zip(GateName::ALL).all(|(r, n)| r.name == n));
        Self { results }
    }

    /// True iff every gate passed
    pub fn allowed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    /// Names of the failing gates, in evaluation order
    pub fn failed_gates(&self) -> Vec<&'static str> {
        self.results
            .iter()
            .filter(|r| !r.passed)
            .map(|r| r.name.as_str())
            .collect()
    }

    pub fn results(&self) -> &[GateResult] {
        &self.results
    }

    pub fn get(&self, name: GateName) -> Option<&GateResult> {
        self.results.iter().find(|r| r.name == name)
    }

    pub fn passed(&self, name: GateName) -> bool {
        self.get(name).map(|r| r.passed).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Compact "A:pass B:FAIL ..." summary for log lines
    pub fn summary(&self) -> String {
        self.results
            .iter()
            .map(|r| format!("{}:{}", r.name.letter(), if r.passed { "pass" } else { "FAIL" }))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Serialize for GateReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.results.len()))?;
        for result in &self.results {
            map.serialize_entry(result.name.as_str(), result)?;
        }
        map.end()
    }
}
