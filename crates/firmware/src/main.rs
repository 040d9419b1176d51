//! Solfapad is [Embassy](https://embassy.dev)-based firmware for a gamepad MIDI controller
//! driving the eVY1, a singing voice synthesizer module. The firmware runs on the
//! [Nucleo-F767ZI development board](https://www.st.com/en/evaluation-tools/nucleo-f767zi.html),
//! which is powered by an F7-series STM32 microcontroller.
//!
//! A Bluetooth co-processor pairs with the controller and streams button frames over UART;
//! this firmware edge-detects the buttons, runs the note and settings state machines, and
//! writes MIDI (note on/off, program changes, and the eVY1's phonetic lyric SysEx) out a
//! second UART at the fixed MIDI baud rate. Board LEDs and the defmt log stand in for the
//! front-panel display.
//!
//! For details about the hardware or how to use the device, see the `README`.

#![no_std]
#![no_main]

mod display;
mod gamepad;
mod performance;

use defmt::*;
use embassy_executor::Spawner;
use embassy_stm32::{
    Config, bind_interrupts,
    gpio::{Level, Output, Speed},
    peripherals,
    time::Hertz,
    usart,
};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, mutex};
use solfapad_lib::settings::Settings;
use static_cell::StaticCell;

use {defmt_rtt as _, panic_probe as _};

bind_interrupts!(
    #[doc(hidden)]
    struct Irqs {
        USART2 => usart::InterruptHandler<peripherals::USART2>;
    }
);

/// The settings store, shared between the control loop and the display tasks.
pub type SettingsAsyncMutex = mutex::Mutex<CriticalSectionRawMutex, Settings>;

/// MIDI runs at a fixed baud rate.
const MIDI_BAUD: u32 = 31250;

/// Baud rate of the gamepad co-processor link.
const LINK_BAUD: u32 = 115_200;

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Initializing Solfapad");

    let mut config = Config::default();
    {
        use embassy_stm32::rcc::*;
        // hse: high-speed external clock
        config.rcc.hse = Some(Hse {
            freq: Hertz(8_000_000),
            mode: HseMode::Bypass,
        });

        // pll: phase-locked loop, crucial for dividing clock
        config.rcc.pll_src = PllSource::HSE;
        config.rcc.pll = Some(Pll {
            prediv: PllPreDiv::DIV4,
            mul: PllMul::MUL216,
            divp: Some(PllPDiv::DIV2), // 8mhz / 4 * 216 / 2 = 216Mhz
            divq: None,
            divr: None,
        });
        config.rcc.ahb_pre = AHBPrescaler::DIV1;
        config.rcc.apb1_pre = APBPrescaler::DIV4;
        config.rcc.apb2_pre = APBPrescaler::DIV2;
        config.rcc.sys = Sysclk::PLL1_P;
    }
    let p = embassy_stm32::init(config);

    static SETTINGS: StaticCell<SettingsAsyncMutex> = StaticCell::new();
    let settings = SETTINGS.init(mutex::Mutex::new(Settings::default()));

    // MIDI out to the eVY1: USART6 TX on PC6 (CN7), DMA-driven
    let mut midi_config = usart::Config::default();
    midi_config.baudrate = MIDI_BAUD;
    let midi_tx = unwrap!(usart::UartTx::new(
        p.USART6,
        p.PC6,
        p.DMA2_CH6,
        midi_config
    ));

    // button frames from the Bluetooth co-processor: USART2 RX on PD6
    let mut link_config = usart::Config::default();
    link_config.baudrate = LINK_BAUD;
    let link_rx = unwrap!(usart::UartRx::new(
        p.USART2,
        Irqs,
        p.PD6,
        p.DMA1_CH5,
        link_config
    ));

    unwrap!(spawner.spawn(gamepad::gamepad_link(link_rx, gamepad::GAMEPAD_SYNC.sender())));

    let indicator = display::INDICATOR_SYNC
        .receiver()
        .expect("Indicator synchronizer should have a receiver available");
    unwrap!(spawner.spawn(display::status_display(settings, indicator)));

    let red_led = Output::new(p.PB14, Level::Low, Speed::Low);
    unwrap!(spawner.spawn(display::cursor_led(red_led, settings)));

    unwrap!(spawner.spawn(performance::performance(
        midi_tx,
        settings,
        gamepad::GAMEPAD_SYNC.anon_receiver(),
        display::INDICATOR_SYNC.sender(),
    )));
}
