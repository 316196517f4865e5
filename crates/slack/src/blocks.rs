use pelada_core::{
    AttendancePrompt, AttendanceSummary, RatingTable, SelectionResult, SplitQuality, TeamPolicy,
};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    Plain { text: String },
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Danger,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ButtonElement {
    pub action_id: String,
    pub text: TextObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ButtonStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ButtonElement {
    pub fn new(action_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            text: TextObject::plain(label),
            style: None,
            value: None,
        }
    }

    pub fn style(mut self, style: ButtonStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section { block_id: String, text: TextObject },
    Actions { block_id: String, elements: Vec<ButtonElement> },
    Context { block_id: String, elements: Vec<TextObject> },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    pub fallback_text: String,
    pub blocks: Vec<Block>,
}

pub struct MessageBuilder {
    fallback_text: String,
    blocks: Vec<Block>,
}

impl MessageBuilder {
    pub fn new(fallback_text: impl Into<String>) -> Self {
        Self { fallback_text: fallback_text.into(), blocks: Vec::new() }
    }

    pub fn section<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut SectionBuilder),
    {
        let mut builder = SectionBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Section { block_id: block_id.into(), text: builder.build() });
        self
    }

    pub fn actions<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ActionsBuilder),
    {
        let mut builder = ActionsBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Actions { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn context<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ContextBuilder),
    {
        let mut builder = ContextBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Context { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn build(self) -> MessageTemplate {
        MessageTemplate { fallback_text: self.fallback_text, blocks: self.blocks }
    }
}

#[derive(Default)]
pub struct SectionBuilder {
    text: Option<TextObject>,
}

impl SectionBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> TextObject {
        self.text.unwrap_or_else(|| TextObject::plain(""))
    }
}

#[derive(Default)]
pub struct ActionsBuilder {
    elements: Vec<ButtonElement>,
}

impl ActionsBuilder {
    pub fn button(&mut self, button: ButtonElement) -> &mut Self {
        self.elements.push(button);
        self
    }

    fn build(self) -> Vec<ButtonElement> {
        self.elements
    }
}

#[derive(Default)]
pub struct ContextBuilder {
    elements: Vec<TextObject>,
}

impl ContextBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> Vec<TextObject> {
        self.elements
    }
}

pub const ATTENDANCE_YES_ACTION: &str = "attendance.yes.v1";
pub const ATTENDANCE_NO_ACTION: &str = "attendance.no.v1";

/// The fixed panel. Both buttons carry the session owner so any click can be routed back.
pub fn attendance_prompt_message(prompt: &AttendancePrompt) -> MessageTemplate {
    let owner = prompt.key.participant_id.as_str();
    MessageBuilder::new(format!("Futebol attendance: is {} in?", prompt.player))
        .section("attendance.prompt.header.v1", |section| {
            section.mrkdwn(format!(":soccer: *Futebol Attendance*\n\n*{}*, are you in?", prompt.player));
        })
        .actions("attendance.prompt.actions.v1", |actions| {
            actions
                .button(
                    ButtonElement::new(ATTENDANCE_YES_ACTION, "Yes")
                        .style(ButtonStyle::Primary)
                        .value(owner),
                )
                .button(
                    ButtonElement::new(ATTENDANCE_NO_ACTION, "No")
                        .style(ButtonStyle::Danger)
                        .value(owner),
                );
        })
        .context("attendance.prompt.context.v1", |context| {
            context.mrkdwn(format!(
                "_Player {} of {}. Click a button; this panel moves to the next player._",
                prompt.position, prompt.total
            ));
        })
        .build()
}

pub fn attendance_summary_message(summary: &AttendanceSummary) -> MessageTemplate {
    MessageBuilder::new(format!(
        "Attendance finished: {} confirmed, {} not going",
        summary.confirmed.len(),
        summary.declined.len()
    ))
    .section("attendance.summary.header.v1", |section| {
        section.mrkdwn(":white_check_mark: *Attendance Finished*");
    })
    .section("attendance.summary.confirmed.v1", |section| {
        section.mrkdwn(format!(
            "*Confirmed ({}):*\n{}",
            summary.confirmed.len(),
            bullet_list(summary.confirmed.iter().map(String::as_str))
        ));
    })
    .section("attendance.summary.declined.v1", |section| {
        section.mrkdwn(format!(
            "*Not going ({}):*\n{}",
            summary.declined.len(),
            bullet_list(summary.declined.iter().map(String::as_str))
        ));
    })
    .context("attendance.summary.hint.v1", |context| {
        context.mrkdwn("Run `/teams` for optimal fair teams or `/remake` to reshuffle randomly.");
    })
    .build()
}

pub fn team_split_message(
    result: &SelectionResult,
    policy: TeamPolicy,
    ratings: &RatingTable,
) -> MessageTemplate {
    let split = &result.split;
    let title = match policy {
        TeamPolicy::Optimal => ":dart: *Optimal Fair Teams (Fixed 5v5)*",
        TeamPolicy::Ranked(_) => ":dart: *Alternative Fair Teams (Fixed 5v5)*",
        TeamPolicy::Random => ":repeat: *Remake Teams (Random 5v5)*",
    };
    let rated = |names: &[String]| {
        names
            .iter()
            .map(|name| format!("- {name} ({:.1})", ratings.rating_of(name)))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let mut builder = MessageBuilder::new(format!(
        "Team A ({:.1}) vs Team B ({:.1}), difference {:.2}",
        split.sum_a,
        split.sum_b,
        split.difference()
    ))
    .section("teams.header.v1", |section| {
        section.mrkdwn(title);
    })
    .section("teams.team_a.v1", |section| {
        section.mrkdwn(format!("*Team A ({:.1}):*\n{}", split.sum_a, rated(&split.team_a)));
    })
    .section("teams.team_b.v1", |section| {
        section.mrkdwn(format!("*Team B ({:.1}):*\n{}", split.sum_b, rated(&split.team_b)));
    })
    .section("teams.difference.v1", |section| {
        section.mrkdwn(format!("*Difference (A vs B):* {:.2}", split.difference()));
    });

    if !result.substitutes.is_empty() {
        builder = builder.section("teams.substitutes.v1", |section| {
            section.mrkdwn(format!(
                "*Substitutes ({}):*\n{}",
                result.substitutes.len(),
                rated(&result.substitutes)
            ));
        });
    }

    let notes: Vec<String> = result
        .rank
        .map(|rank| format!("_Rank {rank} among the distinct splits (0 is the fairest)._"))
        .into_iter()
        .chain(quality_note(result))
        .collect();
    if !notes.is_empty() {
        builder = builder.context("teams.note.v1", |context| {
            for note in notes {
                context.mrkdwn(note);
            }
        });
    }

    builder.build()
}

fn quality_note(result: &SelectionResult) -> Option<String> {
    // A ranked split is not the best one, so its score is not the best diff.
    let best_diff = match result.rank {
        Some(_) => String::new(),
        None => format!(" Best diff found: {:.2}", result.score),
    };
    match result.quality {
        SplitQuality::Random => Some(if result.substitutes.is_empty() {
            "_(Remake mode: random split, may be less fair.)_".to_owned()
        } else {
            "_(Remake mode: random pick & random split, may be less fair.)_".to_owned()
        }),
        SplitQuality::Approximate => Some(format!(
            "_(Too many confirmed players to try every group, so the best ten were sampled.{best_diff})_"
        )),
        SplitQuality::Exact if !result.substitutes.is_empty() => Some(format!(
            "_(From more than 10 confirmed, I picked the 10 that produced the best balance.{best_diff})_"
        )),
        SplitQuality::Exact => None,
    }
}

fn bullet_list<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let lines: Vec<String> = names.map(|name| format!("- {name}")).collect();
    if lines.is_empty() {
        "_nobody_".to_owned()
    } else {
        lines.join("\n")
    }
}

pub fn error_message(summary: &str, correlation_id: &str) -> MessageTemplate {
    MessageBuilder::new(summary.to_owned())
        .section("pelada.error.summary.v1", |section| {
            section.mrkdwn(format!(":warning: {summary}"));
        })
        .context("pelada.error.context.v1", |context| {
            context.plain(format!("Correlation ID: {correlation_id}"));
        })
        .build()
}

pub fn help_message() -> MessageTemplate {
    MessageBuilder::new("Pelada command help")
        .section("pelada.help.summary.v1", |section| {
            section.mrkdwn(
                "*Available commands*\n• `/futebol` start the attendance check for this channel\n• `/teams` optimal fair 5v5 from the last confirmed list\n• `/teams <rank>` the next-fairest alternatives (1, 2, ...)\n• `/remake` random 5v5, may be less fair\n• `/pelada help`",
            );
        })
        .build()
}
