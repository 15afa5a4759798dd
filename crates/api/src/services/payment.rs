use crate::error::ApiError;
use crate::extractors::AuthUser;
use chrono::Utc;
use domain::models::{
    CallbackOutcome, Course, GatewayCallback, InitiatePaymentResponse, PaymentTransaction,
    TransactionStatus, User,
};
use domain::services::{
    final_amount, format_amount, idempotency_key, new_transaction_id, GatewayAdapter,
    GatewayError, PaymentRequestFields,
};
use persistence::entities::PaymentTransactionEntity;
use persistence::repositories::{
    CallbackUpdate, CourseRepository, EntitlementRepository, NewTransaction,
    PaymentTransactionRepository, UserRepository,
};
use shared::pagination::{Page, Pagination};
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Course not found")]
    CourseNotFound,
    #[error("Course is not available for purchase")]
    CourseNotPurchasable,
    #[error("Course is already owned")]
    AlreadyEntitled,
    #[error("A successful payment already exists for this course")]
    AlreadyPaid,
    #[error("Transaction not found")]
    TransactionNotFound,
    #[error("Callback rejected")]
    SignatureInvalid,
    #[error("Not allowed to view this transaction")]
    NotTransactionOwner,
    #[error("User not found")]
    UserNotFound,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("Entitlement grant failed for {transaction_id}")]
    GrantFailed { transaction_id: String },
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::CourseNotFound | PaymentError::TransactionNotFound => {
                ApiError::NotFound(err.to_string())
            }
            PaymentError::UserNotFound => ApiError::NotFound(err.to_string()),
            PaymentError::CourseNotPurchasable => ApiError::Validation(err.to_string()),
            PaymentError::AlreadyEntitled | PaymentError::AlreadyPaid => {
                ApiError::Conflict(err.to_string())
            }
            // Deliberately vague: callers get no hint about which part
            // of the signature check failed.
            PaymentError::SignatureInvalid => ApiError::Validation(err.to_string()),
            PaymentError::NotTransactionOwner => ApiError::Forbidden(err.to_string()),
            PaymentError::Gateway(e) => e.into(),
            PaymentError::GrantFailed { transaction_id } => {
                ApiError::EntitlementGrantFailed { transaction_id }
            }
            PaymentError::Database(e) => e.into(),
        }
    }
}

const SIGNATURE_INVALID_CODE: &str = "SIGNATURE_INVALID";

/// The payment engine: initiation with idempotency, callback
/// verification and the atomic success-plus-entitlement write.
pub struct PaymentService {
    transactions: PaymentTransactionRepository,
    entitlements: EntitlementRepository,
    courses: CourseRepository,
    users: UserRepository,
    gateway: Arc<GatewayAdapter>,
}

impl PaymentService {
    pub fn new(pool: PgPool, gateway: Arc<GatewayAdapter>) -> Self {
        Self {
            transactions: PaymentTransactionRepository::new(pool.clone()),
            entitlements: EntitlementRepository::new(pool.clone()),
            courses: CourseRepository::new(pool.clone()),
            users: UserRepository::new(pool),
            gateway,
        }
    }

    /// Starts a payment for a course.
    ///
    /// Retries within the same minute return the already-created
    /// transaction instead of a new one. The unique index on the
    /// idempotency key closes the race where two initiations pass the
    /// lookup concurrently: the loser's insert fails and it re-reads
    /// the winner's row.
    pub async fn initiate(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<InitiatePaymentResponse, PaymentError> {
        if !self.gateway.is_configured() {
            return Err(GatewayError::NotConfigured.into());
        }

        let course: Course = self
            .courses
            .find_by_id(course_id)
            .await?
            .ok_or(PaymentError::CourseNotFound)?
            .into();
        if !course.is_purchasable() {
            return Err(PaymentError::CourseNotPurchasable);
        }

        if self.entitlements.has_access(user_id, course_id).await? {
            return Err(PaymentError::AlreadyEntitled);
        }

        let now = Utc::now();
        let key = idempotency_key(user_id, course_id, now);

        if let Some(existing) = self.transactions.find_by_idempotency_key(&key).await? {
            return self.replay_initiation(existing);
        }

        let user: User = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(PaymentError::UserNotFound)?
            .into();

        let amount = final_amount(course.price, course.discount_percent);
        let transaction_id = new_transaction_id(now);
        let fields = payment_fields(&transaction_id, format_amount(amount), &user, &course);
        let hash = self.gateway.sign(&fields)?;

        let new = NewTransaction {
            transaction_id,
            idempotency_key: key.clone(),
            user_id,
            course_id,
            amount,
            product_info: fields.product_info,
            customer_name: fields.first_name,
            customer_email: fields.email,
            customer_mobile: fields.phone,
            hash,
        };
        let created = match self.transactions.create(&new).await {
            Ok(entity) => entity,
            // Unique violation on the idempotency key: a concurrent
            // initiation won. Serve its transaction.
            Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23505") => {
                let existing = self
                    .transactions
                    .find_by_idempotency_key(&key)
                    .await?
                    .ok_or(PaymentError::TransactionNotFound)?;
                return self.replay_initiation(existing);
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            transaction_id = %created.transaction_id,
            user_id = %user_id,
            course_id = %course_id,
            amount = %amount,
            "Payment initiated"
        );
        self.build_initiation_response(&created)
    }

    /// Serves a previously created transaction for an idempotent retry.
    fn replay_initiation(
        &self,
        existing: PaymentTransactionEntity,
    ) -> Result<InitiatePaymentResponse, PaymentError> {
        // The lookup only surfaces live or successful rows; terminal
        // failures never reach here and a retry creates a fresh row.
        if existing.status == "success" {
            return Err(PaymentError::AlreadyPaid);
        }
        tracing::info!(
            transaction_id = %existing.transaction_id,
            "Initiation replayed from existing transaction"
        );
        self.build_initiation_response(&existing)
    }

    /// Rebuilds the form-post params from the fields captured at
    /// initiation, so a replay carries the exact hash that was stored
    /// even if the course or the user profile changed since.
    fn build_initiation_response(
        &self,
        entity: &PaymentTransactionEntity,
    ) -> Result<InitiatePaymentResponse, PaymentError> {
        let fields = PaymentRequestFields {
            txn_id: entity.transaction_id.clone(),
            amount: format_amount(entity.amount),
            product_info: entity.product_info.clone(),
            first_name: entity.customer_name.clone(),
            email: entity.customer_email.clone(),
            phone: entity.customer_mobile.clone(),
            udf1: entity.user_id.to_string(),
            udf2: entity.course_id.to_string(),
            udf3: String::new(),
            udf4: String::new(),
            udf5: String::new(),
        };
        let params = self.gateway.build_payment_params(&fields)?;
        Ok(InitiatePaymentResponse {
            transaction_id: entity.transaction_id.clone(),
            payment_url: self.gateway.payment_url()?,
            payment_params: params,
            merchant_key: self.gateway.merchant_key()?.to_string(),
        })
    }

    /// Processes a gateway callback.
    ///
    /// Callbacks are unauthenticated and replayable. The signature is
    /// verified before any state change, a transaction already in
    /// `success` is never touched again, and the success path commits
    /// the status flip and the entitlement in one database transaction.
    pub async fn handle_callback(
        &self,
        callback: &GatewayCallback,
    ) -> Result<CallbackOutcome, PaymentError> {
        if !self.gateway.is_configured() {
            return Err(GatewayError::NotConfigured.into());
        }

        let existing = self
            .transactions
            .find_by_transaction_id(&callback.txnid)
            .await?
            .ok_or(PaymentError::TransactionNotFound)?;

        let current: PaymentTransaction = existing.clone().into();
        if current.status == TransactionStatus::Success {
            tracing::info!(
                transaction_id = %callback.txnid,
                "Callback replay for settled transaction ignored"
            );
            return Ok(outcome_of(&current));
        }

        if !self.gateway.verify(callback)? {
            tracing::error!(
                transaction_id = %callback.txnid,
                gateway_status = %callback.status,
                "Callback signature verification failed"
            );
            let update = CallbackUpdate {
                gateway_payment_id: none_if_empty(&callback.mihpayid),
                gateway_txn_id: none_if_empty(&callback.bank_ref_num),
                response_hash: none_if_empty(&callback.hash),
                error_code: Some(SIGNATURE_INVALID_CODE.to_string()),
                error_message: Some("response signature mismatch".to_string()),
            };
            self.transactions
                .mark_terminal(&callback.txnid, TransactionStatus::Failed.as_str(), &update)
                .await?;
            return Err(PaymentError::SignatureInvalid);
        }

        let status = GatewayAdapter::map_status(&callback.status);
        let update = CallbackUpdate {
            gateway_payment_id: none_if_empty(&callback.mihpayid),
            gateway_txn_id: none_if_empty(&callback.bank_ref_num),
            response_hash: none_if_empty(&callback.hash),
            error_code: none_if_empty(&callback.error),
            error_message: none_if_empty(&callback.error_message),
        };

        match status {
            TransactionStatus::Success => {
                self.settle_success(&existing, &update).await
            }
            TransactionStatus::Pending => {
                let updated = self
                    .transactions
                    .mark_pending(&callback.txnid, &update)
                    .await?;
                let txn: PaymentTransaction = updated.unwrap_or(existing).into();
                Ok(outcome_of(&txn))
            }
            terminal => {
                let updated = self
                    .transactions
                    .mark_terminal(&callback.txnid, terminal.as_str(), &update)
                    .await?;
                let txn: PaymentTransaction = match updated {
                    Some(entity) => entity.into(),
                    // Lost a race against another callback; report the
                    // row as it now stands.
                    None => self
                        .transactions
                        .find_by_transaction_id(&callback.txnid)
                        .await?
                        .ok_or(PaymentError::TransactionNotFound)?
                        .into(),
                };
                tracing::info!(
                    transaction_id = %txn.transaction_id,
                    status = %txn.status,
                    "Payment settled without success"
                );
                Ok(outcome_of(&txn))
            }
        }
    }

    async fn settle_success(
        &self,
        existing: &PaymentTransactionEntity,
        update: &CallbackUpdate,
    ) -> Result<CallbackOutcome, PaymentError> {
        let expiry_days = self
            .courses
            .find_by_id(existing.course_id)
            .await?
            .and_then(|c| c.expiry_days);

        let settled = self
            .transactions
            .complete_with_entitlement(&existing.transaction_id, update, expiry_days)
            .await
            .map_err(|err| {
                tracing::error!(
                    transaction_id = %existing.transaction_id,
                    error = %err,
                    "Success settlement failed, payment and grant rolled back"
                );
                PaymentError::GrantFailed {
                    transaction_id: existing.transaction_id.clone(),
                }
            })?;

        match settled {
            Some((txn, entitlement)) => {
                metrics::counter!("payments_settled_total", "status" => "success").increment(1);
                tracing::info!(
                    transaction_id = %txn.transaction_id,
                    entitlement_id = %entitlement.id,
                    "Payment settled and access granted"
                );
                Ok(outcome_of(&txn.into()))
            }
            // Another callback settled the row first; report its state.
            None => {
                let txn: PaymentTransaction = self
                    .transactions
                    .find_by_transaction_id(&existing.transaction_id)
                    .await?
                    .ok_or(PaymentError::TransactionNotFound)?
                    .into();
                Ok(outcome_of(&txn))
            }
        }
    }

    /// A transaction is visible to its owner and to admins only.
    pub async fn get_status(
        &self,
        transaction_id: &str,
        caller: &AuthUser,
    ) -> Result<PaymentTransaction, PaymentError> {
        let txn: PaymentTransaction = self
            .transactions
            .find_by_transaction_id(transaction_id)
            .await?
            .ok_or(PaymentError::TransactionNotFound)?
            .into();

        if txn.user_id != caller.user_id && !caller.is_admin() {
            return Err(PaymentError::NotTransactionOwner);
        }
        Ok(txn)
    }

    pub async fn history(
        &self,
        user_id: Uuid,
        pagination: Pagination,
    ) -> Result<Page<PaymentTransaction>, PaymentError> {
        let pagination = pagination.clamped();
        let entities = self
            .transactions
            .list_for_user(user_id, pagination.limit, pagination.offset())
            .await?;
        let total = self.transactions.count_for_user(user_id).await?;
        let items = entities.into_iter().map(Into::into).collect();
        Ok(Page::new(items, pagination, total))
    }
}

fn payment_fields(
    transaction_id: &str,
    amount: String,
    user: &User,
    course: &Course,
) -> PaymentRequestFields {
    PaymentRequestFields {
        txn_id: transaction_id.to_string(),
        amount,
        product_info: course.title.clone(),
        first_name: user.name.clone(),
        email: user.email.clone(),
        phone: user.mobile.clone(),
        udf1: user.id.to_string(),
        udf2: course.id.to_string(),
        udf3: String::new(),
        udf4: String::new(),
        udf5: String::new(),
    }
}

fn outcome_of(txn: &PaymentTransaction) -> CallbackOutcome {
    CallbackOutcome {
        transaction_id: txn.transaction_id.clone(),
        status: txn.status,
        gateway_payment_id: txn.gateway_payment_id.clone(),
    }
}

fn none_if_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
