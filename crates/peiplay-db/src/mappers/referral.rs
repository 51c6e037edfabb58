//! Referral mappers

use peiplay_core::{ReferralInvitee, ReferralRecord, Snowflake};

use crate::models::{ReferralInviteeModel, ReferralRecordModel};

impl From<ReferralRecordModel> for ReferralRecord {
    fn from(model: ReferralRecordModel) -> Self {
        ReferralRecord {
            id: Snowflake::new(model.id),
            inviter_id: Snowflake::new(model.inviter_id),
            invitee_id: Snowflake::new(model.invitee_id),
            invite_code: model.invite_code,
            created_at: model.created_at,
        }
    }
}

impl From<ReferralInviteeModel> for ReferralInvitee {
    fn from(model: ReferralInviteeModel) -> Self {
        ReferralInvitee {
            partner_id: Snowflake::new(model.partner_id),
            name: model.name,
            joined_at: model.joined_at,
            earned: model.earned,
        }
    }
}
