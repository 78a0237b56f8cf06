//! Declarative descriptions of the crew members.
//!
//! Role text feeds task status messages and the final report footer; no
//! model call happens at this layer.

/// A named role with a goal and a backstory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentSpec {
    pub role: &'static str,
    pub goal: &'static str,
    pub backstory: &'static str,
}

pub const DATA_COLLECTOR: AgentSpec = AgentSpec {
    role: "Data Collector",
    goal: "Retrieve event data using the search tool",
    backstory: "Has a knack for finding the most exciting events happening around.",
};

pub const DATA_ANALYZER: AgentSpec = AgentSpec {
    role: "Data Analyzer",
    goal: "Analyze the collected data and trigger re-collection if needed",
    backstory: "Known for analytical skills, ensuring data quality and completeness.",
};

pub const SUMMARY_CREATOR: AgentSpec = AgentSpec {
    role: "Summary Creator",
    goal: "Produce a concise summary from the event data",
    backstory: "A skilled writer, able to summarize information clearly and effectively.",
};
