//! Mapping from engine values to response bodies.

use api_types::{
    approval::{BulkApprovalItem, BulkApprovalResponse, PendingApproval},
    auth::AccountView,
    expense::ExpenseView,
    invite::{InviteIssued, InviteView},
    journey::JourneyView,
};
use engine::{Account, BulkApprovalReport, Expense, Invite, IssuedInvite, Journey, VarianceDecision};

pub fn account_view(account: Account) -> AccountView {
    AccountView {
        id: account.id,
        email: account.email,
        name: account.name,
        role: account.role.as_str().to_string(),
        status: account.status.as_str().to_string(),
        is_registered: account.is_registered,
        created_at: account.created_at,
    }
}

pub fn journey_view(journey: Journey) -> JourneyView {
    JourneyView {
        id: journey.id,
        owner_id: journey.owner_id,
        purpose: journey.purpose,
        origin: journey.origin,
        destination: journey.destination,
        travel_date: journey.travel_date,
        distance_km: journey.distance_km,
        duration_minutes: journey.duration_minutes,
        status: journey.status.as_str().to_string(),
        total_cost_minor: journey.total_cost.minor(),
        expected_amount_minor: journey.expected_amount.map(|m| m.minor()),
        variance_minor: journey.variance.minor(),
        expense_ids: journey.expense_ids,
        created_at: journey.created_at,
        updated_at: journey.updated_at,
    }
}

pub fn expense_view(expense: Expense) -> ExpenseView {
    ExpenseView {
        id: expense.id,
        owner_id: expense.owner_id,
        journey_id: expense.journey_id,
        amount_minor: expense.amount.minor(),
        category: expense.category.as_str().to_string(),
        description: expense.description,
        receipt: expense.receipt,
        status: expense.status.as_str().to_string(),
        occurred_at: expense.occurred_at,
        created_at: expense.created_at,
        updated_at: expense.updated_at,
    }
}

pub fn pending_view(pending: engine::PendingApproval) -> PendingApproval {
    PendingApproval {
        expense: expense_view(pending.expense),
        journey: pending.journey.map(journey_view),
    }
}

pub fn decision_str(decision: VarianceDecision) -> &'static str {
    match decision {
        VarianceDecision::Approved => "approved",
        VarianceDecision::Rejected => "rejected",
    }
}

pub fn bulk_view(report: BulkApprovalReport) -> BulkApprovalResponse {
    BulkApprovalResponse {
        id: report.id,
        variance_percent: report.variance_percent,
        approved: report.approved,
        rejected: report.rejected,
        details: report
            .details
            .into_iter()
            .map(|item| BulkApprovalItem {
                id: item.expense_id,
                journey_id: item.journey_id,
                amount_minor: item.amount.minor(),
                expected_minor: item.expected.minor(),
                variance: item.variance,
                action: decision_str(item.decision).to_string(),
            })
            .collect(),
    }
}

pub fn invite_view(invite: Invite) -> InviteView {
    InviteView {
        id: invite.id,
        email: invite.email,
        role: invite.role.as_str().to_string(),
        token: invite.token,
        used: invite.used,
        expires_at: invite.expires_at,
        created_by: invite.created_by,
        created_at: invite.created_at,
    }
}

pub fn issued_view(issued: IssuedInvite) -> InviteIssued {
    InviteIssued {
        email: issued.email,
        role: issued.role.as_str().to_string(),
        token: issued.token,
        temp_password: issued.temp_password,
        expires_at: issued.expires_at,
    }
}
