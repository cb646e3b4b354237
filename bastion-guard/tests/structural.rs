mod support;

use std::sync::Arc;
use std::time::Duration;

use bastion_guard::{
    ActionKey, AuditKind, Category, GuildPolicy, Protection, RemediationOutcome, Reversal,
    Sanction, Skip, StructuralChange, StructuralEvent, StructuralGuard, Verdict,
};
use tokio::time::advance;

use support::{Call, GUILD, MemoryPolicies, RecordingRemediator, ScriptedAudit, YieldingPolicies};

const WINDOW: Duration = Duration::from_secs(60);
const ACTOR: u64 = 7;

struct Harness {
    policies: Arc<MemoryPolicies>,
    audit: Arc<ScriptedAudit>,
    remediator: Arc<RecordingRemediator>,
    guard: StructuralGuard,
}

fn harness(policies: Arc<MemoryPolicies>) -> Harness {
    let audit = ScriptedAudit::new();
    let remediator = RecordingRemediator::new();
    let guard = StructuralGuard::new(policies.clone(), audit.clone(), remediator.clone(), WINDOW);

    Harness {
        policies,
        audit,
        remediator,
        guard,
    }
}

fn channel_deleted(channel_id: u64) -> StructuralEvent {
    StructuralEvent::new(GUILD, StructuralChange::ChannelDeleted { channel_id })
}

#[tokio::test]
async fn disabled_category_never_counts_or_remediates() {
    let policy = GuildPolicy::new(GUILD).with(
        Category::Channel,
        Protection {
            enabled: false,
            threshold: 0,
        },
    );
    let h = harness(MemoryPolicies::with_policy(policy));
    h.audit.answer(AuditKind::ChannelDelete, ACTOR, Some(1));

    for channel_id in 0..50 {
        let verdict = h.guard.handle(channel_deleted(channel_id)).await;
        assert_eq!(verdict, Verdict::Skipped(Skip::Disabled));
    }

    assert!(h.guard.counter().is_empty());
    assert!(h.remediator.calls().is_empty());
}

#[tokio::test]
async fn guild_without_policy_is_ignored() {
    let h = harness(Arc::new(MemoryPolicies::default()));
    h.audit.answer(AuditKind::RoleDelete, ACTOR, Some(3));

    let verdict = h
        .guard
        .handle(StructuralEvent::new(GUILD, StructuralChange::RoleDeleted { role_id: 3 }))
        .await;

    assert_eq!(verdict, Verdict::Skipped(Skip::Disabled));
    assert!(h.remediator.calls().is_empty());
}

#[tokio::test]
async fn exempt_actor_is_never_remediated() {
    let h = harness(MemoryPolicies::enabled(Category::Channel, 1));
    h.policies.exempt(GUILD, ACTOR);

    for channel_id in 0..10 {
        h.audit.answer(AuditKind::ChannelDelete, ACTOR, Some(channel_id));
        let verdict = h.guard.handle(channel_deleted(channel_id)).await;
        assert_eq!(verdict, Verdict::Skipped(Skip::Exempt));
    }

    assert!(h.remediator.calls().is_empty());
}

#[tokio::test]
async fn channel_deletions_past_threshold_banish_once_without_reversal() {
    let h = harness(MemoryPolicies::enabled(Category::Channel, 2));

    let mut verdicts = Vec::new();
    for channel_id in [11, 12, 13] {
        h.audit.answer(AuditKind::ChannelDelete, ACTOR, Some(channel_id));
        verdicts.push(h.guard.handle(channel_deleted(channel_id)).await);
    }

    assert_eq!(verdicts[0], Verdict::Tolerated { count: 1, threshold: 2 });
    assert_eq!(verdicts[1], Verdict::Tolerated { count: 2, threshold: 2 });
    assert_eq!(
        verdicts[2],
        Verdict::Remediated {
            category: Category::Channel,
            outcome: RemediationOutcome {
                revert: false,
                sanction: Sanction::Banish,
            },
        }
    );
    assert_eq!(
        h.remediator.calls(),
        vec![Call::Banish {
            actor_id: ACTOR,
            reason: "Channel protection: limit exceeded".into(),
        }]
    );
}

#[tokio::test]
async fn creation_breach_reverts_before_banishing() {
    let h = harness(MemoryPolicies::enabled(Category::Role, 1));

    for role_id in [21, 22] {
        h.audit.answer(AuditKind::RoleCreate, ACTOR, Some(role_id));
        h.guard
            .handle(StructuralEvent::new(GUILD, StructuralChange::RoleCreated { role_id }))
            .await;
    }

    assert_eq!(
        h.remediator.calls(),
        vec![
            Call::Reverse(Reversal::DeleteRole(22)),
            Call::Banish {
                actor_id: ACTOR,
                reason: "Role protection: limit exceeded".into(),
            },
        ]
    );
}

#[tokio::test]
async fn ban_breach_lifts_the_ban() {
    let h = harness(MemoryPolicies::enabled(Category::Ban, 0));
    h.audit.answer(AuditKind::MemberBanAdd, ACTOR, Some(55));

    let verdict = h
        .guard
        .handle(StructuralEvent::new(GUILD, StructuralChange::BanAdded { user_id: 55 }))
        .await;

    assert!(verdict.is_remediated());
    assert_eq!(h.remediator.calls()[0], Call::Reverse(Reversal::LiftBan(55)));
    assert_eq!(h.remediator.banished(), vec![ACTOR]);
}

#[tokio::test]
async fn unauthorized_bot_is_ejected_on_first_occurrence() {
    let h = harness(MemoryPolicies::enabled(Category::AddedBot, 5));
    h.audit.answer(AuditKind::BotAdd, ACTOR, Some(900));

    let verdict = h
        .guard
        .handle(StructuralEvent::new(
            GUILD,
            StructuralChange::MemberAdded {
                user_id: 900,
                is_bot: true,
            },
        ))
        .await;

    assert_eq!(
        verdict,
        Verdict::Remediated {
            category: Category::AddedBot,
            outcome: RemediationOutcome {
                revert: true,
                sanction: Sanction::Banish,
            },
        }
    );
    assert_eq!(
        h.remediator.calls(),
        vec![
            Call::Reverse(Reversal::EjectMember(900)),
            Call::Banish {
                actor_id: ACTOR,
                reason: "Unauthorized bot addition".into(),
            },
        ]
    );
    assert!(h.guard.counter().is_empty());
}

#[tokio::test]
async fn human_join_is_not_a_bot_addition() {
    let h = harness(MemoryPolicies::enabled(Category::AddedBot, 0));
    h.audit.answer(AuditKind::BotAdd, ACTOR, Some(900));

    let verdict = h
        .guard
        .handle(StructuralEvent::new(
            GUILD,
            StructuralChange::MemberAdded {
                user_id: 901,
                is_bot: false,
            },
        ))
        .await;

    assert_eq!(verdict, Verdict::Skipped(Skip::NotABot));
    assert!(h.remediator.calls().is_empty());
}

#[tokio::test]
async fn kick_entry_for_another_member_is_not_attributed() {
    let h = harness(MemoryPolicies::enabled(Category::Kick, 0));
    h.audit.answer(AuditKind::MemberKick, ACTOR, Some(31));

    let verdict = h
        .guard
        .handle(StructuralEvent::new(GUILD, StructuralChange::MemberRemoved { user_id: 32 }))
        .await;

    assert_eq!(verdict, Verdict::Skipped(Skip::TargetMismatch));
    assert!(h.remediator.calls().is_empty());

    let verdict = h
        .guard
        .handle(StructuralEvent::new(GUILD, StructuralChange::MemberRemoved { user_id: 31 }))
        .await;
    assert!(verdict.is_remediated());
}

#[tokio::test]
async fn missing_audit_entry_leaves_change_unattributed() {
    let h = harness(MemoryPolicies::enabled(Category::GuildSettings, 0));

    let verdict = h
        .guard
        .handle(StructuralEvent::new(GUILD, StructuralChange::GuildSettingsUpdated))
        .await;

    assert_eq!(verdict, Verdict::Skipped(Skip::Unattributed));
    assert!(h.guard.counter().is_empty());
}

#[tokio::test]
async fn own_reversals_are_not_counted() {
    let policies = MemoryPolicies::enabled(Category::Channel, 0);
    let audit = ScriptedAudit::new();
    let remediator = RecordingRemediator::new();
    let guard = StructuralGuard::new(policies, audit.clone(), remediator.clone(), WINDOW)
        .ignoring_actor(1);
    audit.answer(AuditKind::ChannelDelete, 1, Some(5));

    let verdict = guard.handle(channel_deleted(5)).await;

    assert_eq!(verdict, Verdict::Skipped(Skip::OwnAction));
    assert!(remediator.calls().is_empty());
}

#[tokio::test]
async fn failed_banish_is_logged_and_not_retried() {
    let h = harness(MemoryPolicies::enabled(Category::Emoji, 0));
    *h.remediator.fail_banish.lock().unwrap() = true;
    h.audit.answer(AuditKind::EmojiCreate, ACTOR, Some(70));

    let verdict = h
        .guard
        .handle(StructuralEvent::new(GUILD, StructuralChange::EmojiCreated { emoji_id: 70 }))
        .await;

    assert!(verdict.is_remediated());
    assert_eq!(
        h.remediator.calls(),
        vec![
            Call::Reverse(Reversal::DeleteEmoji(70)),
            Call::Banish {
                actor_id: ACTOR,
                reason: "Emoji protection: limit exceeded".into(),
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn window_tumbles_from_first_action() {
    let h = harness(MemoryPolicies::enabled(Category::Sticker, 5));
    h.audit.answer(AuditKind::StickerDelete, ACTOR, Some(1));
    let key = ActionKey::new(GUILD, ACTOR, Category::Sticker);
    let event = StructuralEvent::new(GUILD, StructuralChange::StickerDeleted { sticker_id: 1 });

    h.guard.handle(event).await;
    advance(WINDOW - Duration::from_secs(1)).await;
    assert_eq!(
        h.guard.handle(event).await,
        Verdict::Tolerated { count: 2, threshold: 5 }
    );

    advance(Duration::from_secs(2)).await;
    assert_eq!(h.guard.counter().count(&key), 0);
    assert_eq!(
        h.guard.handle(event).await,
        Verdict::Tolerated { count: 1, threshold: 5 }
    );
}

#[tokio::test]
async fn failed_reversal_still_banishes() {
    let h = harness(MemoryPolicies::enabled(Category::Role, 0));
    *h.remediator.fail_reverse.lock().unwrap() = true;
    h.audit.answer(AuditKind::RoleCreate, ACTOR, Some(5));

    let verdict = h
        .guard
        .handle(StructuralEvent::new(GUILD, StructuralChange::RoleCreated { role_id: 5 }))
        .await;

    assert!(verdict.is_remediated());
    assert_eq!(
        h.remediator.calls(),
        vec![
            Call::Reverse(Reversal::DeleteRole(5)),
            Call::Banish {
                actor_id: ACTOR,
                reason: "Role protection: limit exceeded".into(),
            },
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_breaches_escalate_once() {
    for round in 0..200 {
        let audit = ScriptedAudit::new();
        let remediator = RecordingRemediator::new();
        let policies = Arc::new(YieldingPolicies(MemoryPolicies::enabled(Category::Channel, 3)));
        let guard = Arc::new(StructuralGuard::new(
            policies,
            audit.clone(),
            remediator.clone(),
            WINDOW,
        ));
        audit.answer(AuditKind::ChannelDelete, ACTOR, Some(1));

        let mut handles = Vec::new();
        for channel_id in 0..4 {
            let guard = guard.clone();
            handles.push(tokio::spawn(async move {
                guard.handle(channel_deleted(channel_id)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(remediator.banished(), vec![ACTOR], "round {round}");
    }
}
