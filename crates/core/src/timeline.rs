//! Phased follow-up action timelines.
//!
//! The wording is deliberately neutral: actions suggest reviewing, documenting and talking to a
//! healthcare provider, never a treatment.

use crate::constants::TIMELINE_DISCLAIMER;
use api_shared::{
    ActionPriority, ActionTimelineItem, ActionTimelinePhase, ActionTimelineRes, SeverityLevel,
};
use ActionPriority::{High, Immediate, Low, Moderate};

struct Template {
    title: &'static str,
    description: &'static str,
    priority: ActionPriority,
}

const fn action(title: &'static str, description: &'static str, priority: ActionPriority) -> Template {
    Template {
        title,
        description,
        priority,
    }
}

struct Phases {
    now: &'static [Template],
    short_term: &'static [Template],
    long_term: &'static [Template],
}

static LOW_ATTENTION: Phases = Phases {
    now: &[
        action(
            "Review Report Summary",
            "Look through the key findings and understand which parameters are in range",
            Low,
        ),
        action(
            "Save for Records",
            "Keep a copy of this report for your health records",
            Low,
        ),
    ],
    short_term: &[action(
        "Routine Check-in",
        "Consider discussing results at your next regular healthcare appointment",
        Low,
    )],
    long_term: &[
        action(
            "Schedule Next Test",
            "Plan for periodic health monitoring as recommended by your healthcare provider",
            Low,
        ),
        action(
            "Maintain Healthy Habits",
            "Continue with balanced nutrition and regular physical activity",
            Low,
        ),
    ],
};

static MODERATE_ATTENTION: Phases = Phases {
    now: &[
        action(
            "Review Complete Report",
            "Examine all parameters and their reference ranges in detail",
            Immediate,
        ),
        action(
            "Document Current Values",
            "Keep a record of today's test results for future comparison",
            Immediate,
        ),
    ],
    short_term: &[
        action(
            "Consult Healthcare Provider",
            "Schedule an appointment to discuss parameters requiring attention",
            High,
        ),
        action(
            "Share Report with Specialist",
            "Provide this analysis to your healthcare team for comprehensive evaluation",
            High,
        ),
        action(
            "Explore Related Information",
            "Research reliable health resources about the identified parameters",
            Moderate,
        ),
    ],
    long_term: &[
        action(
            "Follow-up Testing",
            "Consider scheduling follow-up tests as recommended by healthcare provider",
            Moderate,
        ),
        action(
            "Track Lifestyle Changes",
            "Monitor any modifications to diet, exercise, or medication as advised",
            Moderate,
        ),
        action(
            "Update Health Records",
            "Upload new test reports to track longitudinal health trends",
            Low,
        ),
    ],
};

static HIGH_ATTENTION: Phases = Phases {
    now: &[
        action(
            "Review Critical Findings",
            "Carefully note all parameters marked as requiring high attention",
            Immediate,
        ),
        action(
            "Document All Values",
            "Record all test values for discussion with healthcare providers",
            Immediate,
        ),
    ],
    short_term: &[
        action(
            "Contact Healthcare Provider Promptly",
            "Schedule an appointment as soon as possible to discuss findings",
            Immediate,
        ),
        action(
            "Prepare Questions",
            "Write down questions about your results to ask your healthcare provider",
            High,
        ),
        action(
            "Gather Related Records",
            "Collect previous test results and relevant medical history",
            High,
        ),
    ],
    long_term: &[
        action(
            "Follow Provider Recommendations",
            "Adhere to any guidance provided by your healthcare team",
            High,
        ),
        action(
            "Schedule Follow-up Tests",
            "Plan for monitoring tests as directed by healthcare professionals",
            High,
        ),
        action(
            "Regular Monitoring",
            "Establish a routine for ongoing health tracking",
            Moderate,
        ),
    ],
};

fn phases_for(severity: SeverityLevel) -> &'static Phases {
    match severity {
        SeverityLevel::Low => &LOW_ATTENTION,
        SeverityLevel::Moderate => &MODERATE_ATTENTION,
        SeverityLevel::High => &HIGH_ATTENTION,
    }
}

fn phase(timeframe: &str, color: &str, templates: &[Template]) -> ActionTimelinePhase {
    ActionTimelinePhase {
        timeframe: timeframe.to_string(),
        color: color.to_string(),
        actions: templates
            .iter()
            .map(|t| ActionTimelineItem {
                title: t.title.to_string(),
                description: t.description.to_string(),
                priority: t.priority,
            })
            .collect(),
    }
}

/// Builds the three-phase timeline ("Now", "1–3 Days", "1 Month") for a severity level.
pub fn generate_action_timeline(severity: SeverityLevel) -> ActionTimelineRes {
    let phases = phases_for(severity);
    ActionTimelineRes {
        severity_level: severity,
        phases: vec![
            phase("Now", "#3A9CA6", phases.now),
            phase("1–3 Days", "#6B5B95", phases.short_term),
            phase("1 Month", "#2F4A68", phases.long_term),
        ],
        disclaimer: TIMELINE_DISCLAIMER.to_string(),
    }
}

pub fn get_priority_color(priority: ActionPriority) -> &'static str {
    match priority {
        ActionPriority::Immediate => "#3A9CA6",
        ActionPriority::High => "#C89B3C",
        ActionPriority::Moderate => "#6B5B95",
        ActionPriority::Low => "#E5E9ED",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(phase: &ActionTimelinePhase) -> Vec<&str> {
        phase.actions.iter().map(|a| a.title.as_str()).collect()
    }

    #[test]
    fn every_timeline_has_three_phases_with_fixed_colours() {
        for severity in [SeverityLevel::Low, SeverityLevel::Moderate, SeverityLevel::High] {
            let timeline = generate_action_timeline(severity);
            assert_eq!(timeline.severity_level, severity);
            let frames: Vec<(&str, &str)> = timeline
                .phases
                .iter()
                .map(|p| (p.timeframe.as_str(), p.color.as_str()))
                .collect();
            assert_eq!(
                frames,
                vec![("Now", "#3A9CA6"), ("1–3 Days", "#6B5B95"), ("1 Month", "#2F4A68")]
            );
            assert!(timeline.disclaimer.starts_with("These suggestions are for general guidance only."));
        }
    }

    #[test]
    fn low_attention_actions_are_all_low_priority() {
        let timeline = generate_action_timeline(SeverityLevel::Low);
        assert_eq!(titles(&timeline.phases[0]), vec!["Review Report Summary", "Save for Records"]);
        assert!(timeline
            .phases
            .iter()
            .flat_map(|p| &p.actions)
            .all(|a| a.priority == ActionPriority::Low));
    }

    #[test]
    fn high_attention_prompts_provider_contact() {
        let timeline = generate_action_timeline(SeverityLevel::High);
        let short_term = &timeline.phases[1];
        assert_eq!(short_term.actions[0].title, "Contact Healthcare Provider Promptly");
        assert_eq!(short_term.actions[0].priority, ActionPriority::Immediate);
        assert_eq!(timeline.phases[2].actions.len(), 3);
    }

    #[test]
    fn moderate_attention_long_term() {
        let timeline = generate_action_timeline(SeverityLevel::Moderate);
        assert_eq!(
            titles(&timeline.phases[2]),
            vec!["Follow-up Testing", "Track Lifestyle Changes", "Update Health Records"]
        );
    }

    #[test]
    fn priority_colours() {
        assert_eq!(get_priority_color(ActionPriority::Immediate), "#3A9CA6");
        assert_eq!(get_priority_color(ActionPriority::High), "#C89B3C");
        assert_eq!(get_priority_color(ActionPriority::Moderate), "#6B5B95");
        assert_eq!(get_priority_color(ActionPriority::Low), "#E5E9ED");
    }
}
