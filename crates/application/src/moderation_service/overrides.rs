use floodgate_core::{AppResult, MemberKey};
use floodgate_domain::MemberPermissions;
use tracing::info;

use super::ModerationService;

// Strike count and platform restrictions are separate state: each override
// touches exactly one of them.
impl ModerationService {
    /// Resets the member's strikes to zero. Platform restrictions are kept.
    pub async fn forgive(&self, member: MemberKey) -> AppResult<()> {
        let _guard = self.locks.acquire(member).await;
        self.strikes.reset(member).await?;
        info!(chat_id = %member.chat_id, user_id = %member.user_id, "strikes forgiven");
        Ok(())
    }

    /// Restores default member permissions. Strikes are kept.
    pub async fn unrestrict(&self, member: MemberKey) -> AppResult<()> {
        self.call_platform(
            "restrict_member",
            self.platform
                .restrict_member(member, MemberPermissions::member_defaults(), None),
        )
        .await?;
        info!(chat_id = %member.chat_id, user_id = %member.user_id, "member unrestricted");
        Ok(())
    }

    /// Removes the member immediately, regardless of strikes.
    pub async fn ban(&self, member: MemberKey) -> AppResult<()> {
        self.call_platform("remove_member", self.platform.remove_member(member))
            .await?;
        info!(chat_id = %member.chat_id, user_id = %member.user_id, "member banned by admin");
        Ok(())
    }

    /// Returns the member's current strike count.
    pub async fn strike_status(&self, member: MemberKey) -> AppResult<u32> {
        self.strikes.get(member).await
    }
}
