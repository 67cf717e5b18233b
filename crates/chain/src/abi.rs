use ethers::contract::abigen;

abigen!(
    RollupProcessor,
    r#"[
        function getSupportedAssets() external view returns (address[] memory)
        function nextRollupId() external view returns (uint256)
        function dataSize() external view returns (uint256)
        function dataRoot() external view returns (bytes32)
        function nullRoot() external view returns (bytes32)
        function rootRoot() external view returns (bytes32)
        function getEscapeHatchStatus() external view returns (bool, uint256)
        function processRollup(bytes calldata proofData, bytes calldata signatures, uint256[] calldata sigIndexes, bytes calldata viewingKeys) external
        event RollupProcessed(uint256 indexed rollupId, bytes32 dataRoot, bytes32 nullRoot, bytes32 rootRoot)
    ]"#,
);

abigen!(
    Erc20,
    r#"[
        function balanceOf(address owner) external view returns (uint256)
        function allowance(address owner, address spender) external view returns (uint256)
    ]"#,
);
