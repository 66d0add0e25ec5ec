use crate::client::Client;
use crate::error::Result;
use crate::refs::{BranchRef, BuildRef};
use serde_json::{Value, json};

/// Event sent when a build gets promoted.
pub const NEW_PROMOTION_RUN: &str = "new_promotion_run";

const PROMOTE_MUTATION: &str = r#"
mutation CreatePromotionRun($project: String!, $branch: String!, $build: String!, $promotion: String!, $description: String) {
    createPromotionRun(input: {project: $project, branch: $branch, build: $build, promotion: $promotion, description: $description}) {
        errors { message }
    }
}
"#;

const SETUP_MUTATION: &str = r#"
mutation SetupPromotionLevel(
    $project: String!,
    $branch: String!,
    $promotion: String!,
    $description: String,
    $autoPromotion: Boolean!,
    $validationStamps: [String!],
    $include: String,
    $exclude: String,
    $promotionLevels: [String!]
) {
    setupPromotionLevel(input: {project: $project, branch: $branch, promotion: $promotion, description: $description}) {
        errors { message }
    }
    setPromotionLevelAutoPromotionProperty(input: {
        project: $project,
        branch: $branch,
        promotion: $promotion,
        validationStamps: $validationStamps,
        include: $include,
        exclude: $exclude,
        promotionLevels: $promotionLevels
    }) @include(if: $autoPromotion) {
        errors { message }
    }
}
"#;

const SUBSCRIBE_MUTATION: &str = r#"
mutation SubscribePromotionLevel(
    $project: String!,
    $branch: String!,
    $promotion: String!,
    $name: String!,
    $channel: String!,
    $channelConfig: JSON!,
    $events: [String!]!,
    $contentTemplate: String
) {
    subscribePromotionLevelToEvents(input: {
        project: $project,
        branch: $branch,
        promotion: $promotion,
        name: $name,
        channel: $channel,
        channelConfig: $channelConfig,
        events: $events,
        contentTemplate: $contentTemplate
    }) {
        errors { message }
    }
}
"#;

pub fn promote(
    client: &Client,
    build: &BuildRef,
    promotion: &str,
    description: Option<&str>,
) -> Result<()> {
    client.mutate(
        PROMOTE_MUTATION,
        json!({
            "project": build.project,
            "branch": build.branch,
            "build": build.build,
            "promotion": promotion,
            "description": description.unwrap_or_default(),
        }),
        &["createPromotionRun"],
    )
}

/// Criteria for promoting builds automatically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutoPromotion {
    /// Validation stamps which must all pass.
    pub validations: Vec<String>,
    /// Promotion levels which must all be granted.
    pub promotions: Vec<String>,
    /// Regex of validation stamps to include.
    pub include: Option<String>,
    pub exclude: Option<String>,
}

impl AutoPromotion {
    /// Auto promotion is set up only when at least one criterion is given.
    pub fn is_enabled(&self) -> bool {
        !self.validations.is_empty()
            || !self.promotions.is_empty()
            || self.include.as_deref().is_some_and(|i| !i.is_empty())
            || self.exclude.as_deref().is_some_and(|e| !e.is_empty())
    }
}

/// Creates or updates a promotion level and its auto promotion criteria.
pub fn setup_promotion_level(
    client: &Client,
    branch: &BranchRef,
    promotion: &str,
    description: Option<&str>,
    auto: &AutoPromotion,
) -> Result<()> {
    client.mutate(
        SETUP_MUTATION,
        json!({
            "project": branch.project,
            "branch": branch.branch,
            "promotion": promotion,
            "description": description.unwrap_or_default(),
            "autoPromotion": auto.is_enabled(),
            "validationStamps": auto.validations,
            "promotionLevels": auto.promotions,
            "include": auto.include.as_deref().unwrap_or_default(),
            "exclude": auto.exclude.as_deref().unwrap_or_default(),
        }),
        &["setupPromotionLevel", "setPromotionLevelAutoPromotionProperty"],
    )
}

/// Notification subscription on a promotion level.
#[derive(Debug, Clone)]
pub struct Subscription {
    pub name: String,
    pub events: Vec<String>,
    /// Notification channel, such as `slack`.
    pub channel: String,
    pub channel_config: Value,
    pub template: Option<String>,
}

impl Subscription {
    /// A subscription to new promotion runs.
    pub fn on_promotion(name: impl Into<String>, channel: impl Into<String>, config: Value) -> Self {
        Self {
            name: name.into(),
            events: vec![NEW_PROMOTION_RUN.to_string()],
            channel: channel.into(),
            channel_config: config,
            template: None,
        }
    }
}

pub fn subscribe_promotion_level(
    client: &Client,
    branch: &BranchRef,
    promotion: &str,
    subscription: &Subscription,
) -> Result<()> {
    client.mutate(
        SUBSCRIBE_MUTATION,
        json!({
            "project": branch.project,
            "branch": branch.branch,
            "promotion": promotion,
            "name": subscription.name,
            "channel": subscription.channel,
            "channelConfig": subscription.channel_config,
            "events": subscription.events,
            "contentTemplate": subscription.template.as_deref().filter(|t| !t.is_empty()),
        }),
        &["subscribePromotionLevelToEvents"],
    )
}
