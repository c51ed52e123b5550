//! Solidity bindings for the interfaces the verifier and the reference store
//! speak.
//!
//! The string tables in `interfaces` stay the source of truth for interface
//! identifiers and probe batteries. The declarations here give typed calldata
//! decoding, return-data encoding and event logs for the same surface, and the
//! tests below pin the two against each other.

use alloy_sol_types::sol;

// ============================================================================
// STANDARD INTERFACES
// ============================================================================

sol! {
    /// ERC-165 introspection
    interface IERC165 {
        function supportsInterface(bytes4 interfaceId) external view returns (bool);
    }

    /// ERC-721 core, without the metadata or enumeration extensions
    interface IERC721 {
        event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);

        function balanceOf(address owner) external view returns (uint256);
        function ownerOf(uint256 tokenId) external view returns (address);
        function safeTransferFrom(address from, address to, uint256 tokenId) external;
        function safeTransferFrom(address from, address to, uint256 tokenId, bytes calldata data) external;
        function transferFrom(address from, address to, uint256 tokenId) external;
        function approve(address to, uint256 tokenId) external;
        function setApprovalForAll(address operator, bool approved) external;
        function getApproved(uint256 tokenId) external view returns (address);
        function isApprovedForAll(address owner, address operator) external view returns (bool);
    }
}

// ============================================================================
// NFA-1 CORE
// ============================================================================

sol! {
    /// Descriptive agent metadata. Optional references encode as "".
    struct AgentMetadata {
        string persona;
        string experience;
        string voiceRef;
        string animationRef;
        string vaultLocation;
        bytes32 vaultDigest;
    }

    interface INFA1 {
        event AgentCreated(uint256 indexed tokenId, address indexed owner, address logicAddress);
        event ActionExecuted(uint256 indexed tokenId, address indexed logicAddress, bytes32 payloadDigest);
        event LogicUpdated(uint256 indexed tokenId, address oldLogic, address newLogic);
        event AgentFunded(uint256 indexed tokenId, address indexed funder, uint256 amount);
        event StatusChanged(uint256 indexed tokenId, uint8 newStatus);
        event MetadataUpdated(uint256 indexed tokenId);
        event LearningUpdated(uint256 indexed tokenId, bytes32 oldRoot, bytes32 newRoot, uint256 version);

        // Lifecycle and execution
        function executeAction(uint256 tokenId, bytes calldata data) external;
        function setLogicAddress(uint256 tokenId, address newLogic) external;
        function fundAgent(uint256 tokenId) external payable;
        function pause(uint256 tokenId) external;
        function unpause(uint256 tokenId) external;
        function terminate(uint256 tokenId) external;

        // State and metadata
        function getState(uint256 tokenId) external view returns (
            uint256 balance,
            uint8 status,
            address owner,
            address logicAddress,
            uint256 lastActionTimestamp
        );
        function getAgentMetadata(uint256 tokenId) external view returns (AgentMetadata memory);
        function updateAgentMetadata(uint256 tokenId, AgentMetadata calldata metadata) external;

        // Learning
        function updateLearning(uint256 tokenId, bytes32 newRoot, uint256 newVersion) external;
        function getLearningState(uint256 tokenId) external view returns (
            bytes32 learningRoot,
            uint256 version,
            uint256 lastUpdate,
            bool enabled
        );
        function getLearningRoot(uint256 tokenId) external view returns (bytes32);
        function isLearningEnabled(uint256 tokenId) external view returns (bool);
        function getLearningVersion(uint256 tokenId) external view returns (uint256);
        function getLastLearningUpdate(uint256 tokenId) external view returns (uint256);
    }

    /// Minting entry point of the reference store
    interface INFA1Store {
        function createAgent(
            address to,
            address logicAddress,
            string calldata metadataURI,
            AgentMetadata calldata metadata,
            bool learningEnabled
        ) external returns (uint256 tokenId);
    }
}

// ============================================================================
// OPTIONAL EXTENSIONS
// ============================================================================

sol! {
    interface INFA1Lineage {
        function getParent(uint256 tokenId) external view returns (uint256);
        function getGeneration(uint256 tokenId) external view returns (uint256);
    }

    interface INFA1Payment {
        function getPaymentAddress(uint256 tokenId) external view returns (address);
        function setPaymentAddress(uint256 tokenId, address payee) external;
    }

    interface INFA1Identity {
        function getIdentityBinding(uint256 tokenId) external view returns (bytes32);
        function bindIdentity(uint256 tokenId, bytes32 identity) external;
    }

    interface INFA1Receipts {
        function getReceiptCount(uint256 tokenId) external view returns (uint256);
        function getReceipt(uint256 tokenId, uint256 index) external view returns (bytes32);
    }

    interface INFA1Compliance {
        function getComplianceStatus(uint256 tokenId) external view returns (uint8);
        function isCompliant(uint256 tokenId) external view returns (bool);
    }

    interface INFA1LearningModules {
        function getLearningModule(uint256 tokenId) external view returns (address);
        function registerLearningModule(uint256 tokenId, address module) external;
    }

    interface INFA1CircuitBreaker {
        function isGloballyPaused() external view returns (bool);
        function setGlobalPause(bool paused) external;
    }
}

fn optional(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

impl From<&crate::agent::AgentMetadata> for AgentMetadata {
    fn from(metadata: &crate::agent::AgentMetadata) -> Self {
        Self {
            persona: metadata.persona.clone(),
            experience: metadata.experience.clone(),
            voiceRef: metadata.voice_ref.clone().unwrap_or_default(),
            animationRef: metadata.animation_ref.clone().unwrap_or_default(),
            vaultLocation: metadata.vault_location.clone(),
            vaultDigest: metadata.vault_digest,
        }
    }
}

impl From<AgentMetadata> for crate::agent::AgentMetadata {
    fn from(metadata: AgentMetadata) -> Self {
        Self {
            persona: metadata.persona,
            experience: metadata.experience,
            voice_ref: optional(metadata.voiceRef),
            animation_ref: optional(metadata.animationRef),
            vault_location: metadata.vaultLocation,
            vault_digest: metadata.vaultDigest,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
