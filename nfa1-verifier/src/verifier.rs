//! Audit driver.
//!
//! `Verifier` runs the tier batteries and the extension battery against a
//! target through a `ChainReader`, never issuing anything but read-only
//! calls. Individual probes are fault tolerant: a revert or a timeout only
//! settles that probe. A code lookup failure, a timestamp lookup failure or
//! a non-timeout transport failure aborts the invocation.

use crate::battery::{
    self, ProbeSpec, CHECK_DECLARES_NFA1, CHECK_EXECUTE_ACTION, CHECK_FUNDING,
    CHECK_LAST_LEARNING_UPDATE, CHECK_LEARNING_ENABLED, CHECK_LEARNING_ROOT,
    CHECK_LEARNING_STATE, CHECK_LEARNING_VERSION, CHECK_LIFECYCLE, CHECK_LOGIC_SETTER,
    CHECK_METADATA_MUTATION, CHECK_METADATA_READER, CHECK_STATE_READER, CHECK_SUPPORTS_ERC721,
    TIER1_PROBES, TIER2_PROBES, TIER3_PROBES,
};
use crate::chain::ChainReader;
use crate::probe::{self, ProbePlan};
use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolCall;
use nfa1_core::bindings::IERC165::supportsInterfaceCall;
use nfa1_core::interfaces::{self, ExtensionKind, InterfaceDef, ERC721, NFA1};
use nfa1_core::{
    timestamp_from_unix, AuditReport, AuditResult, CallOutcome, ChainError, ExtensionFlags,
    FunctionSignature, InterfaceId, ProbeOutcome, ProbeRecord, QuickCheck, Tier1Checks,
    Tier2Checks, Tier3Checks, Verdict, VerifierConfig,
};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Calldata for `supportsInterface(id)`.
pub fn interface_query(id: InterfaceId) -> Bytes {
    Bytes::from(supportsInterfaceCall { interfaceId: id }.abi_encode())
}

/// Read-only NFA-1 compliance verifier.
#[derive(Debug, Clone)]
pub struct Verifier<C> {
    chain: C,
    config: VerifierConfig,
}

impl<C: ChainReader> Verifier<C> {
    pub fn new(chain: C) -> Self {
        Self {
            chain,
            config: VerifierConfig::default(),
        }
    }

    /// Create with an explicit configuration, validating it first.
    pub fn with_config(chain: C, config: VerifierConfig) -> AuditResult<Self> {
        config.validate()?;
        Ok(Self { chain, config })
    }

    pub fn chain(&self) -> &C {
        &self.chain
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Full structured audit of `target`.
    pub async fn full_audit(&self, target: Address) -> AuditResult<AuditReport> {
        let code = self.chain.code_at(target).await?;
        let audited_at = timestamp_from_unix(self.chain.latest_timestamp().await?);

        if code.is_empty() {
            info!(%target, verdict = %Verdict::NotContract, "Audit short-circuited");
            return Ok(AuditReport::not_contract(target, audited_at));
        }

        let mut session = Session::new(&self.chain, &self.config, target);

        let supports_erc721 = session.interface(CHECK_SUPPORTS_ERC721, &ERC721).await?;
        let declares_nfa1 = session.interface(CHECK_DECLARES_NFA1, &NFA1).await?;
        session.nfa1_declared = declares_nfa1;

        let tier1_results = session.run_battery(TIER1_PROBES).await?;
        let tier1 = Tier1Checks {
            supports_erc721,
            declares_nfa1,
            has_lifecycle: passed(&tier1_results, CHECK_LIFECYCLE),
            has_state_reader: passed(&tier1_results, CHECK_STATE_READER),
            has_metadata_reader: passed(&tier1_results, CHECK_METADATA_READER),
            has_metadata_mutation: passed(&tier1_results, CHECK_METADATA_MUTATION),
            ..Default::default()
        }
        .tally();

        let tier2_results = session.run_battery(TIER2_PROBES).await?;
        let tier2 = Tier2Checks {
            has_learning_state: passed(&tier2_results, CHECK_LEARNING_STATE),
            has_learning_root: passed(&tier2_results, CHECK_LEARNING_ROOT),
            has_learning_enabled: passed(&tier2_results, CHECK_LEARNING_ENABLED),
            has_learning_version: passed(&tier2_results, CHECK_LEARNING_VERSION),
            has_last_learning_update: passed(&tier2_results, CHECK_LAST_LEARNING_UPDATE),
            ..Default::default()
        }
        .tally();

        let tier3_results = session.run_battery(TIER3_PROBES).await?;
        let tier3 = Tier3Checks {
            has_execute_action: passed(&tier3_results, CHECK_EXECUTE_ACTION),
            has_logic_setter: passed(&tier3_results, CHECK_LOGIC_SETTER),
            has_funding: passed(&tier3_results, CHECK_FUNDING),
            ..Default::default()
        }
        .tally();

        let extensions = session.extensions().await?;
        let verdict = Verdict::from_tiers(tier1.met(), tier2.met(), tier3.met());

        info!(
            %target,
            %verdict,
            tier1 = tier1.passed,
            tier2 = tier2.passed,
            tier3 = tier3.passed,
            "Audit complete"
        );

        Ok(AuditReport {
            target,
            audited_at,
            is_contract: true,
            tier1,
            tier2,
            tier3,
            extensions,
            verdict,
            probes: session.probes,
        })
    }

    /// Cheap compliance hint: one self-declaration query plus at most two
    /// raw probes. Never reaches tier 3 on self-declaration alone.
    pub async fn quick_check(&self, target: Address) -> AuditResult<QuickCheck> {
        if self.chain.code_at(target).await?.is_empty() {
            return Ok(QuickCheck::NEGATIVE);
        }

        let mut session = Session::new(&self.chain, &self.config, target);
        if !session.interface(CHECK_DECLARES_NFA1, &NFA1).await? {
            return Ok(QuickCheck::NEGATIVE);
        }

        let mut tier = 1;
        if session
            .raw(CHECK_LEARNING_VERSION, interfaces::GET_LEARNING_VERSION)
            .await?
            .is_detected()
        {
            tier = 2;
            if session
                .raw(CHECK_LOGIC_SETTER, interfaces::SET_LOGIC_ADDRESS)
                .await?
                .is_detected()
            {
                tier = 3;
            }
        }

        debug!(%target, tier, "Quick check complete");
        Ok(QuickCheck::likely(tier))
    }

    /// Primary primitive: does `target` self-declare `interface`?
    pub async fn supports_interface(
        &self,
        target: Address,
        interface: &InterfaceDef,
    ) -> AuditResult<bool> {
        Session::new(&self.chain, &self.config, target)
            .interface(interface.name, interface)
            .await
    }

    /// Secondary primitive: raw selector probe of `signature`.
    pub async fn function_exists(
        &self,
        target: Address,
        signature: &str,
    ) -> AuditResult<ProbeOutcome> {
        Session::new(&self.chain, &self.config, target)
            .raw("function_exists", signature)
            .await
    }

    /// Extension battery on its own.
    pub async fn detect_extensions(&self, target: Address) -> AuditResult<ExtensionFlags> {
        Session::new(&self.chain, &self.config, target)
            .extensions()
            .await
    }
}

fn passed(results: &BTreeMap<&'static str, bool>, check: &str) -> bool {
    results.get(check).copied().unwrap_or(false)
}

// ============================================================================
// SESSION
// ============================================================================

/// State of one invocation: what the target declared and the probe trail.
struct Session<'a, C: ?Sized> {
    chain: &'a C,
    config: &'a VerifierConfig,
    target: Address,
    nfa1_declared: bool,
    probes: Vec<ProbeRecord>,
}

impl<'a, C: ChainReader + ?Sized> Session<'a, C> {
    fn new(chain: &'a C, config: &'a VerifierConfig, target: Address) -> Self {
        Self {
            chain,
            config,
            target,
            nfa1_declared: false,
            probes: Vec::new(),
        }
    }

    /// Issue one static call under the configured timeout. `None` means the
    /// call timed out.
    async fn call(&self, data: Bytes) -> AuditResult<Option<CallOutcome>> {
        let call = self.chain.static_call(self.target, data);
        let result = match self.config.call_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => Err(ChainError::Timeout {
                    method: "eth_call".to_string(),
                    elapsed_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                }),
            },
            None => call.await,
        };

        match result {
            Ok(outcome) => Ok(Some(outcome)),
            Err(err) if err.is_timeout() => {
                warn!(target = %self.target, error = %err, "Probe timed out");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn record(&mut self, check: &str, signature: &FunctionSignature, outcome: ProbeOutcome) {
        debug!(
            check,
            signature = signature.canonical(),
            selector = %signature.selector(),
            %outcome,
            "Probe settled"
        );
        self.probes.push(ProbeRecord {
            check: check.to_string(),
            signature: signature.canonical().to_string(),
            selector: signature.selector(),
            outcome,
        });
    }

    /// ERC-165 query. Declared only on a success whose first word is 1.
    async fn interface(&mut self, check: &str, interface: &InterfaceDef) -> AuditResult<bool> {
        let signature = FunctionSignature::parse(interfaces::SUPPORTS_INTERFACE)?;
        let (declared, outcome) = match self.call(interface_query(interface.id())).await? {
            Some(answer) if probe::is_declared(&answer) => (true, ProbeOutcome::ExistsConfirmed),
            Some(_) => (false, ProbeOutcome::AbsentConfirmed),
            None => (false, ProbeOutcome::Inconclusive),
        };
        self.record(check, &signature, outcome);
        Ok(declared)
    }

    /// Raw selector probe with placeholder arguments, no fallback.
    async fn raw(&mut self, check: &str, signature: &str) -> AuditResult<ProbeOutcome> {
        let signature = FunctionSignature::parse(signature)?;
        let outcome = self.call_and_classify(&signature, probe::ReturnShape::Any).await?;
        self.record(check, &signature, outcome);
        Ok(outcome)
    }

    async fn call_and_classify(
        &self,
        signature: &FunctionSignature,
        shape: probe::ReturnShape,
    ) -> AuditResult<ProbeOutcome> {
        let calldata = signature.placeholder_calldata(self.config.placeholder_base);
        Ok(match self.call(calldata).await? {
            Some(answer) => probe::classify(&answer, shape),
            None => ProbeOutcome::Inconclusive,
        })
    }

    /// Probe one battery entry under the fallback policy.
    async fn probe(&mut self, spec: &ProbeSpec) -> AuditResult<ProbeOutcome> {
        let signature = spec.parse()?;
        let hazard = spec.hazard()?;
        let declared = spec.in_nfa1 && self.nfa1_declared;

        let outcome = match probe::plan(hazard, declared) {
            ProbePlan::Settle(outcome) => outcome,
            ProbePlan::Call => self.call_and_classify(&signature, spec.shape).await?,
        };
        self.record(spec.check, &signature, outcome);
        Ok(outcome)
    }

    /// Run a battery. A check passes when every probe filed under it is
    /// detected.
    async fn run_battery(
        &mut self,
        battery: &[ProbeSpec],
    ) -> AuditResult<BTreeMap<&'static str, bool>> {
        let mut results: BTreeMap<&'static str, bool> = BTreeMap::new();
        for spec in battery {
            let detected = self.probe(spec).await?.is_detected();
            let entry = results.entry(spec.check).or_insert(true);
            *entry = *entry && detected;
        }
        Ok(results)
    }

    async fn extensions(&mut self) -> AuditResult<ExtensionFlags> {
        let mut flags = ExtensionFlags::default();
        for kind in ExtensionKind::ALL {
            let mut present = true;
            for spec in battery::extension_probes(kind) {
                present &= self.probe(&spec).await?.is_detected();
            }
            flags.set(kind, present);
        }
        Ok(flags)
    }
}
