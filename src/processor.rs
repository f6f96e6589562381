use borsh::BorshSerialize;
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    clock::Clock,
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed, set_return_data},
    program_error::ProgramError,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction,
    sysvar::Sysvar,
};

use crate::{
    constants::seeds,
    error::VestingError,
    escrow::Escrow,
    events::{emit, StreamEvent},
    instruction::VestingInstruction,
    query::{self, find_registry_address, find_stream_address},
    state::{RegistryAccount, StreamAccount},
};

pub struct Processor;
impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = VestingInstruction::unpack(instruction_data)?;

        match instruction {
            VestingInstruction::Initialize => Self::initialize(accounts, program_id),
            VestingInstruction::Create {
                recipient,
                amount,
                duration_seconds,
            } => Self::create_stream(accounts, program_id, recipient, amount, duration_seconds),
            VestingInstruction::Withdraw { stream_id } => {
                Self::withdraw(accounts, program_id, stream_id)
            }
            VestingInstruction::Cancel { stream_id } => {
                Self::cancel(accounts, program_id, stream_id)
            }
            VestingInstruction::WithdrawableAmountOf { stream_id } => {
                Self::withdrawable_amount_of(accounts, program_id, stream_id)
            }
            VestingInstruction::RefundableAmountOf { stream_id } => {
                Self::refundable_amount_of(accounts, program_id, stream_id)
            }
            VestingInstruction::TotalStreams => Self::total_streams(accounts, program_id),
        }
    }

    fn initialize(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let accounts_iter = &mut accounts.iter();
        let payer_account = next_account_info(accounts_iter)?;
        let registry_account = next_account_info(accounts_iter)?;
        let system_program_account = next_account_info(accounts_iter)?;

        if !payer_account.is_signer {
            msg!("[Vesting] Payer needs to be signer");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let (registry_key, bump) = find_registry_address(program_id);
        if registry_key != *registry_account.key {
            msg!(
                "[Vesting] Registry address mismatch {} != {}",
                registry_account.key,
                registry_key
            );
            return Err(ProgramError::InvalidSeeds);
        }

        if registry_account.owner == program_id
            && query::load_registry(&registry_account.try_borrow_data()?).is_ok()
        {
            msg!("[Vesting] Registry already initialised");
            return Ok(());
        }

        let rent = Rent::get()?;
        let funding = rent
            .minimum_balance(RegistryAccount::LEN)
            .saturating_sub(registry_account.lamports());
        Self::create_program_account(
            payer_account,
            registry_account,
            system_program_account,
            program_id,
            RegistryAccount::LEN,
            funding,
            &[seeds::REGISTRY, &[bump]],
        )?;

        Self::store(&RegistryAccount::new(bump), registry_account)?;

        msg!("[Vesting] Registry initialised at {}", registry_account.key);

        Ok(())
    }

    fn create_stream(
        accounts: &[AccountInfo],
        program_id: &Pubkey,
        recipient: Pubkey,
        amount: u64,
        duration_seconds: u64,
    ) -> ProgramResult {
        let accounts_iter = &mut accounts.iter();
        let sender_account = next_account_info(accounts_iter)?;
        let registry_account = next_account_info(accounts_iter)?;
        let stream_account = next_account_info(accounts_iter)?;
        let system_program_account = next_account_info(accounts_iter)?;

        if !sender_account.is_signer {
            msg!("[Vesting] Sender needs to be signer");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut registry = Self::load_registry(program_id, registry_account)?;
        let stream_id = registry.next_id;

        let (stream_key, bump) = find_stream_address(program_id, stream_id);
        if stream_key != *stream_account.key {
            msg!("[Vesting] Stream account is not the address for id {}", stream_id);
            return Err(ProgramError::InvalidSeeds);
        }

        let clock = Clock::get()?;
        let stream = StreamAccount::open(
            stream_id,
            *sender_account.key,
            recipient,
            amount,
            duration_seconds,
            clock.unix_timestamp,
            bump,
        )?;

        // Lamports already sitting on the address only count towards rent,
        // never towards the escrowed amount
        let rent = Rent::get()?;
        let required_lamports = rent
            .minimum_balance(StreamAccount::LEN)
            .saturating_sub(stream_account.lamports())
            .checked_add(amount)
            .ok_or(VestingError::ArithmeticOverflow)?;
        if sender_account.lamports() < required_lamports {
            msg!(
                "[Vesting] Insufficient balance. Balance: {}, required: {}",
                sender_account.lamports(),
                required_lamports
            );
            return Err(VestingError::InsufficientBalance.into());
        }

        Self::create_program_account(
            sender_account,
            stream_account,
            system_program_account,
            program_id,
            StreamAccount::LEN,
            required_lamports,
            &[seeds::STREAM, &stream_id.to_le_bytes(), &[bump]],
        )?;

        registry.allocate_id()?;
        Self::store(&stream, stream_account)?;
        Self::store(&registry, registry_account)?;

        msg!("[Vesting] Created stream account: {:?}", stream);

        emit(&StreamEvent::Created {
            stream_id,
            sender: stream.sender,
            recipient: stream.recipient,
            total_amount: stream.total_amount,
            start_time: stream.start_time,
            end_time: stream.end_time,
        })
    }

    fn withdraw(accounts: &[AccountInfo], program_id: &Pubkey, stream_id: u64) -> ProgramResult {
        let accounts_iter = &mut accounts.iter();
        let recipient_account = next_account_info(accounts_iter)?;
        let stream_account = next_account_info(accounts_iter)?;

        if !recipient_account.is_signer {
            msg!("[Vesting] Recipient needs to be signer");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut stream = Self::load_stream(program_id, stream_account, stream_id)?;
        let now = Clock::get()?.unix_timestamp;

        let amount = stream.withdraw(recipient_account.key, now).map_err(|e| {
            msg!("[Vesting] Withdrawal from stream {} rejected: {}", stream_id, e);
            e
        })?;

        let rent = Rent::get()?;
        Escrow::new(stream_account, &rent).extract(amount, recipient_account)?;
        Self::store(&stream, stream_account)?;

        msg!(
            "[Vesting] Withdrawal of {} from stream account: {:?}",
            amount,
            stream
        );

        emit(&StreamEvent::Withdrawn {
            stream_id,
            recipient: stream.recipient,
            amount,
            timestamp: now,
        })
    }

    fn cancel(accounts: &[AccountInfo], program_id: &Pubkey, stream_id: u64) -> ProgramResult {
        let accounts_iter = &mut accounts.iter();
        let sender_account = next_account_info(accounts_iter)?;
        let recipient_account = next_account_info(accounts_iter)?;
        let stream_account = next_account_info(accounts_iter)?;

        if !sender_account.is_signer {
            msg!("[Vesting] Sender needs to be signer");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut stream = Self::load_stream(program_id, stream_account, stream_id)?;
        if stream.recipient != *recipient_account.key {
            msg!("[Vesting] Recipient account doesn't match stream");
            return Err(VestingError::NotAuthorized.into());
        }

        let now = Clock::get()?.unix_timestamp;
        let settlement = stream.cancel(sender_account.key, now).map_err(|e| {
            msg!("[Vesting] Cancel of stream {} rejected: {}", stream_id, e);
            e
        })?;

        msg!("[Vesting] Cancel requested");

        let rent = Rent::get()?;
        let escrow = Escrow::new(stream_account, &rent);
        escrow.extract(settlement.vested, recipient_account)?;
        escrow.extract(settlement.refund, sender_account)?;
        Self::store(&stream, stream_account)?;

        msg!("[Vesting] Cancelled stream account: {:?}", stream);

        emit(&StreamEvent::Cancelled {
            stream_id,
            sender: stream.sender,
            refunded_amount: settlement.refund,
            timestamp: now,
        })
    }

    fn withdrawable_amount_of(
        accounts: &[AccountInfo],
        program_id: &Pubkey,
        stream_id: u64,
    ) -> ProgramResult {
        let stream = Self::stream_view(accounts, program_id, stream_id)?;
        let now = Clock::get()?.unix_timestamp;
        set_return_data(&stream.withdrawable_amount_of(now).to_le_bytes());
        Ok(())
    }

    fn refundable_amount_of(
        accounts: &[AccountInfo],
        program_id: &Pubkey,
        stream_id: u64,
    ) -> ProgramResult {
        let stream = Self::stream_view(accounts, program_id, stream_id)?;
        let now = Clock::get()?.unix_timestamp;
        set_return_data(&stream.refundable_amount(now).to_le_bytes());
        Ok(())
    }

    fn total_streams(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let accounts_iter = &mut accounts.iter();
        let registry = Self::load_registry(program_id, next_account_info(accounts_iter)?)?;
        set_return_data(&registry.next_id.to_le_bytes());
        Ok(())
    }

    /// Creates a program-owned PDA funded with `lamports` from `payer`.
    ///
    /// The address may already hold lamports sent by anyone; those stay in
    /// the account and the PDA is allocated and assigned in place.
    fn create_program_account<'a>(
        payer: &AccountInfo<'a>,
        target: &AccountInfo<'a>,
        system_program: &AccountInfo<'a>,
        program_id: &Pubkey,
        space: usize,
        lamports: u64,
        signer_seeds: &[&[u8]],
    ) -> ProgramResult {
        if !target.data_is_empty() || target.owner != system_program.key {
            msg!("[Vesting] Account {} already in use", target.key);
            return Err(ProgramError::AccountAlreadyInitialized);
        }

        if target.lamports() == 0 {
            return invoke_signed(
                &system_instruction::create_account(
                    payer.key,
                    target.key,
                    lamports,
                    space as u64,
                    program_id,
                ),
                &[payer.clone(), target.clone(), system_program.clone()],
                &[signer_seeds],
            );
        }

        msg!(
            "[Vesting] Account {} pre-funded with {} lamports",
            target.key,
            target.lamports()
        );
        if lamports > 0 {
            invoke(
                &system_instruction::transfer(payer.key, target.key, lamports),
                &[payer.clone(), target.clone(), system_program.clone()],
            )?;
        }
        invoke_signed(
            &system_instruction::allocate(target.key, space as u64),
            &[target.clone(), system_program.clone()],
            &[signer_seeds],
        )?;
        invoke_signed(
            &system_instruction::assign(target.key, program_id),
            &[target.clone(), system_program.clone()],
            &[signer_seeds],
        )
    }

    fn stream_view(
        accounts: &[AccountInfo],
        program_id: &Pubkey,
        stream_id: u64,
    ) -> Result<StreamAccount, ProgramError> {
        let accounts_iter = &mut accounts.iter();
        let stream_account = next_account_info(accounts_iter)?;
        Self::load_stream(program_id, stream_account, stream_id)
    }

    fn load_registry(
        program_id: &Pubkey,
        registry_account: &AccountInfo,
    ) -> Result<RegistryAccount, ProgramError> {
        if registry_account.owner != program_id {
            msg!("[Vesting] Registry is not initialised");
            return Err(VestingError::NotInitialized.into());
        }

        let registry = query::load_registry(&registry_account.try_borrow_data()?)?;

        let expected =
            Pubkey::create_program_address(&[seeds::REGISTRY, &[registry.bump]], program_id)?;
        if expected != *registry_account.key {
            msg!("[Vesting] Registry address mismatch");
            return Err(ProgramError::InvalidSeeds);
        }

        Ok(registry)
    }

    fn load_stream(
        program_id: &Pubkey,
        stream_account: &AccountInfo,
        stream_id: u64,
    ) -> Result<StreamAccount, ProgramError> {
        if stream_account.owner != program_id {
            msg!("[Vesting] Stream {} not found", stream_id);
            return Err(VestingError::StreamNotFound.into());
        }

        let stream = query::load_stream(&stream_account.try_borrow_data()?)?;

        let expected = Pubkey::create_program_address(
            &[seeds::STREAM, &stream_id.to_le_bytes(), &[stream.bump]],
            program_id,
        )?;
        if stream.id != stream_id || expected != *stream_account.key {
            msg!("[Vesting] Stream account is not the address for id {}", stream_id);
            return Err(ProgramError::InvalidSeeds);
        }

        Ok(stream)
    }

    fn store<T: BorshSerialize>(value: &T, account: &AccountInfo) -> ProgramResult {
        let bytes =
            borsh::to_vec(value).map_err(|e| ProgramError::BorshIoError(e.to_string()))?;
        let mut data = account.try_borrow_mut_data()?;
        if data.len() != bytes.len() {
            msg!("[Vesting] Account {} has unexpected size", account.key);
            return Err(ProgramError::InvalidAccountData);
        }
        data.copy_from_slice(&bytes);
        Ok(())
    }
}
