use alloy::sol;

sol! {
    #[sol(rpc)]
    interface ILoanLedger {
        struct LoanRecord {
            address owner;
            address partner;
            uint256 amount;
            uint256 timestamp;
            string description;
            uint256 loanDate;
            uint256 expectedReturnDate;
        }

        function recordLoan(
            address partner,
            uint256 amount,
            string description,
            uint256 loanDate,
            uint256 expectedReturnDate
        ) external returns (bytes32);

        function payLoan(bytes32 loanId) external payable;

        function getLoan(bytes32 loanId) external view returns (LoanRecord memory);
    }

    #[sol(rpc)]
    interface IAchievementNFT {
        function mintAchievement(address recipient, bytes32 loanId, uint256 amount) external returns (uint256);

        function hasAchievement(bytes32 loanId) external view returns (bool);

        function getTokenIdForLoan(bytes32 loanId) external view returns (uint256);

        function tokenIdToLoan(uint256 tokenId) external view returns (bytes32);

        function ownerOf(uint256 tokenId) external view returns (address);

        function tokenURI(uint256 tokenId) external view returns (string);

        function balanceOf(address owner) external view returns (uint256);

        function totalSupply() external view returns (uint256);
    }
}
